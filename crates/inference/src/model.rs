use crate::{
    backend::{InferenceBackend, InferenceOutput},
    config::{ModelConfig, ModelFamily},
    detection::Detection,
    labels::{COCO_80, LabelTable, TORCHVISION_COCO_91},
    processing::post::{PostProcessor, TransformParams},
};
use image::RgbImage;
use parking_lot::Mutex;
use preprocess::{LetterboxPreProcessor, NativePreProcessor, Preprocess};

/// Metadata key Ultralytics exports use for the class-name dict.
const NAMES_METADATA_KEY: &str = "names";

/// A loaded model that turns an image into raw, unfiltered detections.
pub trait Detector: Send + Sync {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>>;
}

/// Preprocess, infer and decode for one model. The whole pipeline sits behind
/// a mutex: sessions and preprocessing buffers need exclusive access per run.
pub struct OnnxDetector<B: InferenceBackend> {
    name: String,
    pipeline: Mutex<Pipeline<B>>,
}

struct Pipeline<B> {
    backend: B,
    preprocessor: Box<dyn Preprocess>,
    postprocessor: PostProcessor,
}

impl<B: InferenceBackend> OnnxDetector<B> {
    pub fn load(config: &ModelConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let backend = B::load_model(config)?;
        Self::with_backend(backend, config)
    }

    pub fn with_backend(backend: B, config: &ModelConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let labels = label_table(&backend, config)?;

        tracing::debug!(
            model = %config.name,
            classes = labels.len(),
            "Label table ready"
        );

        let preprocessor: Box<dyn Preprocess> = match config.family {
            ModelFamily::Ultralytics => Box::new(LetterboxPreProcessor::new(
                config.input_size,
                config.normalization,
            )),
            ModelFamily::Torchvision => Box::new(NativePreProcessor::new(config.normalization)),
        };

        Ok(Self {
            name: config.name.clone(),
            pipeline: Mutex::new(Pipeline {
                backend,
                preprocessor,
                postprocessor: PostProcessor::new(config.score_threshold, labels),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

fn label_table<B: InferenceBackend>(
    backend: &B,
    config: &ModelConfig,
) -> anyhow::Result<LabelTable> {
    match config.family {
        ModelFamily::Torchvision => Ok(LabelTable::from_static(&TORCHVISION_COCO_91)),
        ModelFamily::Ultralytics => {
            let from_metadata = backend
                .metadata(NAMES_METADATA_KEY)?
                .and_then(|raw| LabelTable::from_ultralytics_metadata(&raw));

            Ok(from_metadata.unwrap_or_else(|| {
                tracing::warn!(
                    model = %config.name,
                    "No class names in model metadata, using COCO labels"
                );
                LabelTable::from_static(&COCO_80)
            }))
        }
    }
}

impl<B: InferenceBackend> Detector for OnnxDetector<B> {
    fn detect(&self, image: &RgbImage) -> anyhow::Result<Vec<Detection>> {
        let (width, height) = image.dimensions();
        let mut pipeline = self.pipeline.lock();
        let Pipeline {
            backend,
            preprocessor,
            postprocessor,
        } = &mut *pipeline;

        let input = preprocessor.preprocess(image.as_raw(), width, height)?;

        let output: InferenceOutput = {
            let _infer_span = tracing::info_span!("model_inference", model = %self.name).entered();
            backend.infer(&input.tensor)?
        };

        let transform = TransformParams::from_preprocess(&input, width, height);
        let detections = postprocessor.parse_detections(&output, &transform)?;

        tracing::debug!(
            model = %self.name,
            detections = detections.len(),
            "Inference complete"
        );

        Ok(detections)
    }
}
