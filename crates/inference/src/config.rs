use preprocess::{DEFAULT_INPUT_SIZE, Normalization};
use serde::Deserialize;

/// Output layout of a detection export. Selects both the preprocessing and
/// the decoder used for a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelFamily {
    /// Ultralytics export with NMS baked in: one `[1, N, 6]` tensor of
    /// `x1, y1, x2, y2, score, class` rows in letterboxed input space.
    Ultralytics,
    /// Torchvision detection export: separate `boxes`, `labels`, `scores`
    /// tensors in source pixel space.
    Torchvision,
}

impl ModelFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelFamily::Ultralytics => "ultralytics",
            ModelFamily::Torchvision => "torchvision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

/// Graph tensor names. Only the ones relevant to the model's family are read.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TensorNames {
    pub input: String,
    pub rows: String,
    pub boxes: String,
    pub labels: String,
    pub scores: String,
}

impl Default for TensorNames {
    fn default() -> Self {
        Self {
            input: "images".to_string(),
            rows: "output0".to_string(),
            boxes: "boxes".to_string(),
            labels: "labels".to_string(),
            scores: "scores".to_string(),
        }
    }
}

/// One entry of the model registry.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub name: String,
    pub path: String,
    pub family: ModelFamily,
    #[serde(default = "default_input_size")]
    pub input_size: (u32, u32),
    #[serde(default)]
    pub normalization: Normalization,
    #[serde(default)]
    pub execution_provider: ExecutionProvider,
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Raw score below which model output rows are discarded before selection.
    #[serde(default = "default_score_threshold")]
    pub score_threshold: f32,
    #[serde(default)]
    pub tensors: TensorNames,
}

fn default_input_size() -> (u32, u32) {
    DEFAULT_INPUT_SIZE
}

fn default_intra_threads() -> usize {
    4
}

fn default_score_threshold() -> f32 {
    0.25
}

impl ModelConfig {
    /// Reject settings that cannot produce a usable pipeline.
    pub fn validate(&self) -> anyhow::Result<()> {
        let (width, height) = self.input_size;
        if width == 0 || height == 0 {
            anyhow::bail!(
                "Model `{}` has an invalid input_size {}x{}: both sides must be non-zero",
                self.name,
                width,
                height
            );
        }
        Ok(())
    }

    /// Create default configuration for testing
    #[cfg(test)]
    pub fn test_default(name: &str, family: ModelFamily) -> Self {
        Self {
            name: name.to_string(),
            path: format!("/models/{}.onnx", name),
            family,
            input_size: DEFAULT_INPUT_SIZE,
            normalization: Normalization::Unit,
            execution_provider: ExecutionProvider::Cpu,
            intra_threads: 1,
            score_threshold: 0.25,
            tensors: TensorNames::default(),
        }
    }
}
