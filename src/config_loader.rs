use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Hyperparameters for the startup/offline training pass
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub learning_rate: f32,
    /// Visit examples in shuffled order each epoch instead of file order.
    /// Shuffling draws from a generator seeded with `seed`, so training
    /// stays reproducible either way.
    pub shuffle: bool,
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: 25,
            learning_rate: 0.01,
            shuffle: false,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BedsideConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_model_path")]
    pub model_path: String,
    #[serde(default = "default_train_data")]
    pub train_data: String,
    /// Held-out dataset evaluated once after load/training, if set
    #[serde(default)]
    pub eval_data: Option<String>,
    #[serde(default)]
    pub training: TrainingConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_model_path() -> String {
    "model.bin".to_string()
}

fn default_train_data() -> String {
    "training_data.csv".to_string()
}

impl Default for BedsideConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            model_path: default_model_path(),
            train_data: default_train_data(),
            eval_data: None,
            training: TrainingConfig::default(),
        }
    }
}

impl BedsideConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Load configuration: defaults, then `bedside.toml`, then `BEDSIDE_*`
/// environment variables, later sources winning.
pub fn load_config() -> Result<BedsideConfig, figment::Error> {
    Figment::from(Serialized::defaults(BedsideConfig::default()))
        .merge(Toml::file("bedside.toml"))
        .merge(Env::prefixed("BEDSIDE_").split("__"))
        .extract()
}
