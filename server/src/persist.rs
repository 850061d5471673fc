use std::fs;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use serde::Serialize;
use shared::OpencvMetrics;
use thiserror::Error;
use uuid::Uuid;

use crate::config::PersistenceConfig;

const JPEG_QUALITY: u8 = 95;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Record serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct LabeledScore {
    pub label: String,
    pub score: f32,
}

/// All label/score pairs for one classifier, sorted descending by score,
/// with the winning pair pulled out.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifierSummary {
    pub scores: Vec<LabeledScore>,
    pub top: LabeledScore,
}

impl ClassifierSummary {
    pub fn new(labels: &[String], scores: &[f32]) -> Self {
        let mut scores: Vec<LabeledScore> = labels
            .iter()
            .zip(scores)
            .map(|(label, &score)| LabeledScore {
                label: label.clone(),
                score,
            })
            .collect();
        scores.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let top = scores.first().cloned().unwrap_or(LabeledScore {
            label: String::new(),
            score: 0.0,
        });
        Self { scores, top }
    }
}

#[derive(Debug, Serialize)]
pub struct PredictionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub image_file: String,
    pub condition: ClassifierSummary,
    pub iqa: ClassifierSummary,
    pub opencv_metrics: OpencvMetrics,
}

/// Best-effort on-disk telemetry: one directory per request holding the
/// original image and a structured prediction record. Callers log and
/// swallow failures; the serving path never depends on this.
#[derive(Clone)]
pub struct ResultPersister {
    data_root: PathBuf,
    enabled: bool,
}

impl ResultPersister {
    pub fn new(config: PersistenceConfig) -> Self {
        Self {
            data_root: PathBuf::from(config.data_root),
            enabled: config.enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Microsecond timestamp plus a random suffix: two requests finishing in
    /// the same microsecond on different workers still get distinct ids.
    fn request_id(now: DateTime<Utc>) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{}-{}", now.format("%Y%m%dT%H%M%S%6f"), &suffix[..8])
    }

    pub fn save(
        &self,
        image: &RgbImage,
        condition: ClassifierSummary,
        iqa: ClassifierSummary,
        opencv_metrics: OpencvMetrics,
    ) -> Result<PathBuf, PersistError> {
        let now = Utc::now();
        let id = Self::request_id(now);
        let dir = self.data_root.join(&id);
        fs::create_dir_all(&dir)?;

        let image_file = "image.jpg".to_string();
        write_jpeg(image, &dir.join(&image_file))?;

        let record = PredictionRecord {
            id,
            timestamp: now,
            image_file,
            condition,
            iqa,
            opencv_metrics,
        };
        let file = File::create(dir.join("prediction.json"))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &record)?;
        Ok(dir)
    }
}

fn write_jpeg(image: &RgbImage, path: &Path) -> Result<(), PersistError> {
    let file = File::create(path)?;
    let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), JPEG_QUALITY);
    image.write_with_encoder(encoder)?;
    Ok(())
}
