use super::{InferenceBackend, InferenceOutput};
use crate::config::{ExecutionProvider, ModelConfig, ModelFamily, TensorNames};
use anyhow::Context;
use ndarray::ArrayD;
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::TensorRef,
};

pub struct OrtBackend {
    name: String,
    session: Session,
    family: ModelFamily,
    tensors: TensorNames,
}

impl OrtBackend {
    fn build_session(config: &ModelConfig) -> anyhow::Result<Session> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(config.intra_threads)?;

        match config.execution_provider {
            ExecutionProvider::Cuda => {
                tracing::info!(model = %config.name, "Using CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!(model = %config.name, "Using CPU execution provider");
            }
        }

        Ok(builder.commit_from_file(&config.path)?)
    }
}

impl InferenceBackend for OrtBackend {
    fn load_model(config: &ModelConfig) -> anyhow::Result<Self> {
        let session = Self::build_session(config)?;

        tracing::info!(
            model = %config.name,
            path = %config.path,
            family = config.family.as_str(),
            "Model loaded"
        );

        Ok(Self {
            name: config.name.clone(),
            session,
            family: config.family,
            tensors: config.tensors.clone(),
        })
    }

    fn infer(&mut self, input: &ArrayD<f32>) -> anyhow::Result<InferenceOutput> {
        let outputs = self.session.run(ort::inputs![
            self.tensors.input.as_str() => TensorRef::from_array_view(input.view())?
        ])?;

        let model = self.name.as_str();
        let tensors = &self.tensors;

        match self.family {
            ModelFamily::Ultralytics => {
                let rows = require_output(outputs.get(tensors.rows.as_str()), model, &tensors.rows)?
                    .try_extract_array::<f32>()?;
                Ok(InferenceOutput::Rows(rows.into_owned()))
            }
            ModelFamily::Torchvision => {
                let boxes = require_output(outputs.get(tensors.boxes.as_str()), model, &tensors.boxes)?
                    .try_extract_array::<f32>()?;
                let labels =
                    require_output(outputs.get(tensors.labels.as_str()), model, &tensors.labels)?
                        .try_extract_array::<i64>()?;
                let scores =
                    require_output(outputs.get(tensors.scores.as_str()), model, &tensors.scores)?
                        .try_extract_array::<f32>()?;

                Ok(InferenceOutput::Tensors {
                    boxes: boxes.into_owned(),
                    labels: labels.into_owned(),
                    scores: scores.into_owned(),
                })
            }
        }
    }

    fn metadata(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.session.metadata()?.custom(key))
    }
}

/// A configured output name that the session does not produce is a model
/// configuration error, reported with both names.
fn require_output<T>(output: Option<T>, model: &str, tensor: &str) -> anyhow::Result<T> {
    output.with_context(|| format!("Model `{model}` has no output tensor `{tensor}`"))
}
