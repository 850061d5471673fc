use actix_cors::Cors;
use actix_web::{App, HttpServer, web};
use server::config::ServerConfig;
use server::inference::store::ModelStore;
use server::persist::ResultPersister;
use server::routes::configure_routes;
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    dotenv::dotenv().ok();

    if let Ok(current_dir) = env::current_dir() {
        log::info!("Current working directory: {}", current_dir.display());
    } else {
        log::error!("Failed to get the current working directory.");
    }

    let config = ServerConfig::load().map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("Configuration loading failed: {}", e),
        )
    })?;

    let store = match ModelStore::load(&config.models) {
        Ok(store) => store,
        Err(e) => {
            log::error!("Failed to load models at startup: {}", e);
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Model loading failed: {}", e),
            ));
        }
    };
    let store = web::Data::new(store);
    let persister = web::Data::new(ResultPersister::new(config.persistence.clone()));

    let port = env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let bind_address = format!("0.0.0.0:{}", port);

    log::info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        App::new()
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allowed_methods(vec!["GET", "POST", "OPTIONS"])
                    .allowed_headers(vec![
                        actix_web::http::header::ACCEPT,
                        actix_web::http::header::CONTENT_TYPE,
                    ])
                    .max_age(3600),
            )
            .app_data(store.clone())
            .app_data(persister.clone())
            .configure(configure_routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
