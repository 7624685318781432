use common::Environment;
use inference::{ModelConfig, SelectionPolicy};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable holding the path of the TOML config file
pub const CONFIG_PATH_VAR: &str = "DETECTOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/detector.toml";

const DEFAULT_MAX_UPLOAD_BYTES: i64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub bind_addr: String,
    pub environment: String,
    pub otel_endpoint: Option<String>,
    pub default_model: String,
    /// Reject unknown model names instead of falling back to the default
    pub strict_model_selection: bool,
    pub max_upload_bytes: usize,
    #[serde(default)]
    pub selection: SelectionPolicy,
    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

impl Config {
    pub fn environment(&self) -> Environment {
        Environment::parse(&self.environment)
    }
}

/// Load configuration from the file named by `DETECTOR_CONFIG` (or
/// `config/detector.toml`), then apply `DETECTOR_*` environment overrides.
pub fn get_configuration() -> Result<Config, config::ConfigError> {
    let path = std::env::var(CONFIG_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

    load_configuration(&path)
}

/// A missing file is not an error: defaults and environment still apply.
pub fn load_configuration(path: &Path) -> Result<Config, config::ConfigError> {
    let config = config::Config::builder()
        .set_default("bind_addr", "0.0.0.0:5000")?
        .set_default("environment", Environment::from_env().as_str())?
        .set_default("default_model", "yolo11n.pt")?
        .set_default("strict_model_selection", false)?
        .set_default("max_upload_bytes", DEFAULT_MAX_UPLOAD_BYTES)?
        .add_source(config::File::from(path).required(false))
        .add_source(
            config::Environment::with_prefix("DETECTOR")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    config.try_deserialize::<Config>()
}
