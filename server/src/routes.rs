use actix_web::{HttpResponse, web};
use log::error;
use serde::Serialize;
use serde_json::Value;
use shared::PredictResponse;

use crate::inference::preprocess::decode_base64_image;
use crate::inference::store::ModelStore;
use crate::metrics;
use crate::persist::{ClassifierSummary, ResultPersister};

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/predict").route(web::post().to(predict)))
        .service(web::resource("/health").route(web::get().to(health)));
}

/// Pulls the `imageBase64` field out of a raw JSON body. The error string is
/// the exact message the client receives with the 400.
pub fn extract_image_base64(body: &[u8]) -> Result<String, String> {
    let value: Value =
        serde_json::from_slice(body).map_err(|_| "Invalid JSON body".to_string())?;
    let field = match value.as_object().and_then(|obj| obj.get("imageBase64")) {
        Some(field) => field,
        None => return Err("imageBase64 field is required".to_string()),
    };
    match field.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err("imageBase64 must be a non-empty base64 string".to_string()),
    }
}

async fn predict(
    store: web::Data<ModelStore>,
    persister: web::Data<ResultPersister>,
    body: web::Bytes,
) -> HttpResponse {
    let image_base64 = match extract_image_base64(&body) {
        Ok(value) => value,
        Err(message) => return HttpResponse::BadRequest().json(ErrorResponse { error: message }),
    };

    let image = match decode_base64_image(&image_base64) {
        Ok(image) => image,
        Err(e) => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: e.to_string(),
            });
        }
    };

    let iqa_scores = match store.iqa.predict(&image) {
        Ok(scores) => scores,
        Err(e) => {
            error!("IQA model inference error: {:?}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Model inference error: {}", e),
            });
        }
    };

    let condition_scores = match store.condition.predict(&image) {
        Ok(scores) => scores,
        Err(e) => {
            error!("Condition model inference error: {:?}", e);
            return HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("Model inference error: {}", e),
            });
        }
    };

    let opencv_metrics = metrics::compute(&image);

    if persister.is_enabled() {
        let condition = ClassifierSummary::new(store.condition.labels(), &condition_scores);
        let iqa = ClassifierSummary::new(store.iqa.labels(), &iqa_scores);
        if let Err(e) = persister.save(&image, condition, iqa, opencv_metrics.clone()) {
            error!("Failed to persist prediction: {}", e);
        }
    }

    HttpResponse::Ok().json(PredictResponse {
        condition_scores,
        iqa_scores,
        opencv_metrics,
    })
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "status": "ok" }))
}
