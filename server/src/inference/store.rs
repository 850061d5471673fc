use std::fs;
use std::sync::{Arc, Mutex};

use image::RgbImage;
use tch::{CModule, Device, Kind, Tensor};
use thiserror::Error;

use crate::config::{ModelConfig, ModelsConfig};
use crate::inference::preprocess::input_tensor;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Could not load model from {path}: {source}")]
    Model {
        path: String,
        #[source]
        source: tch::TchError,
    },
    #[error("Could not load label set from {path}: {cause}")]
    Labels { path: String, cause: String },
    #[error("Model '{name}' failed its startup probe: {source}")]
    Probe {
        name: String,
        #[source]
        source: tch::TchError,
    },
    #[error("Model '{name}' outputs {got} scores but its label set has {expected} entries")]
    LabelMismatch {
        name: String,
        got: usize,
        expected: usize,
    },
}

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Model execution failed: {0}")]
    Model(#[from] tch::TchError),
}

/// One loaded classifier: a TorchScript module paired with the ordered label
/// set its output vector is index-aligned with.
#[derive(Clone)]
pub struct Classifier {
    module: Arc<Mutex<CModule>>,
    labels: Arc<Vec<String>>,
    input_size: u32,
    device: Device,
}

impl Classifier {
    pub fn load(name: &str, config: &ModelConfig) -> Result<Self, StoreError> {
        let device = Device::cuda_if_available();
        let module =
            CModule::load_on_device(&config.model_path, device).map_err(|e| StoreError::Model {
                path: config.model_path.clone(),
                source: e,
            })?;
        let labels = load_labels(&config.labels_path)?;
        let classifier = Self {
            module: Arc::new(Mutex::new(module)),
            labels: Arc::new(labels),
            input_size: config.input_size,
            device,
        };
        classifier.verify_output_arity(name)?;
        Ok(classifier)
    }

    /// Runs a zeros batch through the module and checks that the output
    /// length matches the label set. A mismatched model/label pair must
    /// never start serving.
    fn verify_output_arity(&self, name: &str) -> Result<(), StoreError> {
        let size = self.input_size as i64;
        let probe = Tensor::zeros(&[1, 3, size, size], (Kind::Float, self.device));
        let output = self
            .module
            .lock()
            .unwrap()
            .forward_ts(&[probe])
            .map_err(|e| StoreError::Probe {
                name: name.to_string(),
                source: e,
            })?;
        let got = output.view([-1]).size()[0] as usize;
        if got != self.labels.len() {
            return Err(StoreError::LabelMismatch {
                name: name.to_string(),
                got,
                expected: self.labels.len(),
            });
        }
        Ok(())
    }

    pub fn predict(&self, image: &RgbImage) -> Result<Vec<f32>, InferenceError> {
        let input = input_tensor(image, self.input_size).to_device(self.device);
        let output = self.module.lock().unwrap().forward_ts(&[input])?;
        let output_flat = output.to_kind(Kind::Float).view([-1]);
        let num_elements = output_flat.size()[0] as usize;
        let mut scores = vec![0.0f32; num_elements];
        output_flat.copy_data(&mut scores, num_elements);
        Ok(scores)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn input_size(&self) -> u32 {
        self.input_size
    }
}

fn load_labels(path: &str) -> Result<Vec<String>, StoreError> {
    let raw = fs::read_to_string(path).map_err(|e| StoreError::Labels {
        path: path.to_string(),
        cause: e.to_string(),
    })?;
    let labels: Vec<String> = serde_json::from_str(&raw).map_err(|e| StoreError::Labels {
        path: path.to_string(),
        cause: e.to_string(),
    })?;
    if labels.is_empty() {
        return Err(StoreError::Labels {
            path: path.to_string(),
            cause: "label set is empty".to_string(),
        });
    }
    Ok(labels)
}

/// Both classifiers, loaded once at startup and shared read-only with every
/// request handler.
pub struct ModelStore {
    pub iqa: Classifier,
    pub condition: Classifier,
}

impl ModelStore {
    pub fn load(config: &ModelsConfig) -> Result<Self, StoreError> {
        let iqa = Classifier::load("iqa", &config.iqa)?;
        log::info!(
            "Loaded IQA model ({} classes, input {}x{})",
            iqa.labels().len(),
            iqa.input_size(),
            iqa.input_size()
        );
        let condition = Classifier::load("condition", &config.condition)?;
        log::info!(
            "Loaded condition model ({} classes, input {}x{})",
            condition.labels().len(),
            condition.input_size(),
            condition.input_size()
        );
        Ok(Self { iqa, condition })
    }
}
