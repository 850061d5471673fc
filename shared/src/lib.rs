use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone)]
pub struct PredictRequest {
    #[serde(rename = "imageBase64")]
    pub image_base64: String,
}

#[derive(Serialize, Deserialize, Clone)]
pub struct PredictResponse {
    #[serde(rename = "conditionScores")]
    pub condition_scores: Vec<f32>,
    #[serde(rename = "iqaScores")]
    pub iqa_scores: Vec<f32>,
    #[serde(rename = "opencvMetrics")]
    pub opencv_metrics: OpencvMetrics,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OpencvMetrics {
    #[serde(rename = "Sharpness_Laplacian")]
    pub sharpness_laplacian: f64,
    #[serde(rename = "Contrast_STD")]
    pub contrast_std: f64,
    #[serde(rename = "Brightness")]
    pub brightness: f64,
    #[serde(rename = "NoiseVariance")]
    pub noise_variance: f64,
    #[serde(rename = "Blockiness")]
    pub blockiness: f64,
}
