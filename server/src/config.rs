use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub models: ModelsConfig,
    pub persistence: PersistenceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelsConfig {
    pub iqa: ModelConfig,
    pub condition: ModelConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub model_path: String,
    pub labels_path: String,
    pub input_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersistenceConfig {
    pub enabled: bool,
    pub data_root: String,
}

impl ServerConfig {
    pub fn load() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path =
            std::env::var("SERVER_CONFIG").unwrap_or_else(|_| "config/server.yaml".to_string());
        let config_str = std::fs::read_to_string(&config_path)
            .map_err(|e| format!("failed to read {}: {}", config_path, e))?;
        let config: ServerConfig = serde_yaml::from_str(&config_str)?;
        Ok(config)
    }
}
