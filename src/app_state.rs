use crate::config_loader::BedsideConfig;
use crate::model::LinearModel;
use std::sync::Arc;

/// How the serving model came to exist at startup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSource {
    /// Deserialized from the persisted model file
    Loaded,
    /// Trained from the dataset at startup, then persisted
    Trained,
}

impl ModelSource {
    pub fn as_str(self) -> &'static str {
        match self {
            ModelSource::Loaded => "loaded",
            ModelSource::Trained => "trained",
        }
    }
}

/// Shared state injected into every request handler.
///
/// The model is read-only for the life of the process once constructed, so
/// it is shared as a plain `Arc` with no lock around the hot path.
pub struct AppState {
    pub model: Arc<LinearModel>,
    pub model_source: ModelSource,
    pub config: BedsideConfig,
}

impl AppState {
    pub fn new(model: LinearModel, model_source: ModelSource, config: BedsideConfig) -> Self {
        Self {
            model: Arc::new(model),
            model_source,
            config,
        }
    }
}
