use crate::config::ModelConfig;
use ndarray::{ArrayD, IxDyn};

#[cfg(feature = "ort-backend")]
pub mod ort;

pub trait InferenceBackend: Send {
    fn load_model(config: &ModelConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Run inference on a preprocessed input tensor
    fn infer(&mut self, input: &ArrayD<f32>) -> anyhow::Result<InferenceOutput>;

    /// Look up a custom metadata entry stored in the model file.
    fn metadata(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Raw model output, one variant per model family.
#[derive(Debug, Clone)]
pub enum InferenceOutput {
    /// `[1, N, 6]` rows of `x1, y1, x2, y2, score, class` (model input space)
    Rows(ArrayD<f32>),
    /// Separate tensors in source image space
    Tensors {
        boxes: ArrayD<f32>,  // [N, 4] xyxy
        labels: ArrayD<i64>, // [N]
        scores: ArrayD<f32>, // [N]
    },
}

#[cfg(test)]
impl InferenceOutput {
    pub(crate) fn empty_rows() -> Self {
        InferenceOutput::Rows(ArrayD::zeros(IxDyn(&[1, 0, 6])))
    }
}
