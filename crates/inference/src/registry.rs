use crate::model::Detector;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("No models configured")]
    Empty,

    #[error("Model `{0}` is configured more than once")]
    DuplicateModel(String),

    #[error("Default model `{default}` is not among the configured models ({available})")]
    UnknownDefault { default: String, available: String },
}

/// Outcome of looking a model up by the name a client sent.
#[derive(Clone)]
pub struct ResolvedModel {
    /// Name of the model that will actually run
    pub name: String,
    pub detector: Arc<dyn Detector>,
    /// A name was requested but did not match any model
    pub fell_back: bool,
}

/// Name to model mapping, built once at startup and read-only afterwards.
pub struct ModelRegistry {
    models: HashMap<String, Arc<dyn Detector>>,
    default_model: String,
}

impl ModelRegistry {
    pub fn new(
        models: Vec<(String, Arc<dyn Detector>)>,
        default_model: &str,
    ) -> Result<Self, RegistryError> {
        if models.is_empty() {
            return Err(RegistryError::Empty);
        }

        let mut map = HashMap::with_capacity(models.len());
        for (name, detector) in models {
            if map.insert(name.clone(), detector).is_some() {
                return Err(RegistryError::DuplicateModel(name));
            }
        }

        if !map.contains_key(default_model) {
            let mut available: Vec<&str> = map.keys().map(String::as_str).collect();
            available.sort_unstable();
            return Err(RegistryError::UnknownDefault {
                default: default_model.to_string(),
                available: available.join(", "),
            });
        }

        Ok(Self {
            models: map,
            default_model: default_model.to_string(),
        })
    }

    /// Load every configured model with the ONNX Runtime backend.
    #[cfg(feature = "ort-backend")]
    pub fn load(
        configs: &[crate::config::ModelConfig],
        default_model: &str,
    ) -> anyhow::Result<Self> {
        use crate::{backend::ort::OrtBackend, model::OnnxDetector};
        use anyhow::Context;

        let mut models: Vec<(String, Arc<dyn Detector>)> = Vec::with_capacity(configs.len());
        for config in configs {
            let detector = OnnxDetector::<OrtBackend>::load(config)
                .with_context(|| format!("Failed to load model `{}` from {}", config.name, config.path))?;
            models.push((config.name.clone(), Arc::new(detector)));
        }

        Ok(Self::new(models, default_model)?)
    }

    /// Resolve a requested name, falling back to the default model when the
    /// name does not match exactly. Missing or empty names select the default
    /// silently.
    pub fn resolve(&self, requested: Option<&str>) -> ResolvedModel {
        let requested = requested.filter(|name| !name.is_empty());

        if let Some((name, detector)) = requested.and_then(|name| self.models.get_key_value(name)) {
            return ResolvedModel {
                name: name.clone(),
                detector: Arc::clone(detector),
                fell_back: false,
            };
        }

        ResolvedModel {
            name: self.default_model.clone(),
            detector: Arc::clone(&self.models[&self.default_model]),
            fell_back: requested.is_some(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    pub fn default_model(&self) -> &str {
        &self.default_model
    }

    /// Registered model names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.models.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
