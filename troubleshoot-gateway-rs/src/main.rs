// troubleshoot-gateway-rs/src/main.rs
// Troubleshooting Gateway - HTTP entry point for the HVAC scenario trainer
// Port 8282 by default (TROUBLESHOOT_GATEWAY_SERVICE_PORT)
//
// Wires together:
// - Anthropic model client
// - Scenario pipeline (normalize, prompt, validate)
// - Scenario and feedback stores (memory or PostgreSQL)

use std::sync::Arc;

use anyhow::Context;
use config_rs::{AppConfig, DEFAULT_GATEWAY_PORT};
use llm_client::{AnthropicClient, ModelClient};
use scenario_store::{create_stores, StorageConfig};
use scenario_validation::SchemaOptions;
use tracing_subscriber::EnvFilter;
use troubleshoot_gateway::{create_router, AppState, ScenarioPipeline};

const SERVICE_NAME: &str = "troubleshoot-gateway";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config_rs::load_env();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env(SERVICE_NAME);
    let schema = if config.require_recommendations {
        SchemaOptions::default()
    } else {
        SchemaOptions::without_recommendations()
    };

    let stores = create_stores(&StorageConfig::from(&config.storage), schema.clone())
        .await
        .context("Failed to set up storage")?;
    tracing::info!("Storage backend: {}", config.storage.backend);

    let model = Arc::new(AnthropicClient::new(&config.model));
    if !model.is_configured() {
        tracing::warn!("ANTHROPIC_API_KEY is not set; scenario generation will fail until it is");
    }
    tracing::info!("Using model {}", model.model());

    let pipeline = Arc::new(ScenarioPipeline::new(model, schema));
    let app = create_router(AppState::new(config.service.service_name(), pipeline, stores));

    let addr = config.service.get_bind_address(DEFAULT_GATEWAY_PORT);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Troubleshooting gateway listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
