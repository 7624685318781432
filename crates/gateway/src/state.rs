use crate::{config::Config, metrics::DetectMetrics};
use inference::{ModelRegistry, SelectionPolicy};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ModelRegistry>,
    pub selection: SelectionPolicy,
    pub strict_model_selection: bool,
    pub metrics: DetectMetrics,
}

impl AppState {
    pub fn new(
        registry: ModelRegistry,
        selection: SelectionPolicy,
        strict_model_selection: bool,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            selection,
            strict_model_selection,
            metrics: DetectMetrics::new("gateway"),
        }
    }

    pub fn from_config(registry: ModelRegistry, config: &Config) -> Self {
        Self::new(registry, config.selection, config.strict_model_selection)
    }
}
