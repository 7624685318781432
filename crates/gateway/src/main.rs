use anyhow::Context;
use common::{TelemetryGuard, setup_logging};
use gateway::{AppState, config::get_configuration, run_server};
use inference::ModelRegistry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = get_configuration().context("Failed to load configuration")?;
    let environment = config.environment();

    let _telemetry = match config.otel_endpoint.as_deref() {
        Some(endpoint) => Some(TelemetryGuard::init("gateway", endpoint, environment)?),
        None => {
            setup_logging(environment);
            None
        }
    };

    tracing::info!(config = ?config, "Loaded configuration");

    let models = config.models.clone();
    let default_model = config.default_model.clone();
    let registry =
        tokio::task::spawn_blocking(move || ModelRegistry::load(&models, &default_model))
            .await?
            .context("Failed to build model registry")?;

    tracing::info!(
        models = ?registry.names(),
        default_model = registry.default_model(),
        "Models loaded"
    );

    let state = AppState::from_config(registry, &config);
    run_server(&config.bind_addr, state, config.max_upload_bytes).await
}
