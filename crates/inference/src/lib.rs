pub mod backend;
pub mod config;
pub mod detection;
pub mod labels;
pub mod model;
pub mod processing;
pub mod registry;
pub mod selection;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput};
pub use config::{ExecutionProvider, ModelConfig, ModelFamily, TensorNames};
pub use detection::Detection;
pub use model::{Detector, OnnxDetector};
pub use registry::{ModelRegistry, RegistryError, ResolvedModel};
pub use selection::{Selection, SelectionPolicy};
