//! Crop Health Advisory - Backend Server
//!
//! Serves crop-health labels and farming advisories over HTTP, learning from
//! the remote oracle whenever the local model is unsure.

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;

use crop_advisory::{
    create_app,
    external::{resolve_model, GeminiClient},
    logging,
    services::ModelRegistry,
    AppState, Config,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load().context("Failed to load configuration")?;

    let _log_guard = logging::init(&config.logging).context("Failed to initialize logging")?;

    tracing::info!("Starting Crop Health Advisory Server");
    tracing::info!("Environment: {}", config.environment);

    // Resolve the oracle model before serving anything
    let gemini = GeminiClient::new(&config.oracle).context("Oracle client unavailable")?;
    let model = resolve_model(&gemini, &config.oracle.models)
        .await
        .context("No working oracle model found")?;
    let oracle = Arc::new(gemini.oracle(model));

    // Load model artifacts
    let paths = config.data.artifact_paths();
    let (classifier, encoder) = paths
        .load()
        .with_context(|| format!("Failed to load model artifacts from {}", paths.model.display()))?;
    tracing::info!(
        "Loaded classifier with {} trees, classes {:?}",
        classifier.forest.n_trees(),
        classifier.forest.classes()
    );
    let registry = Arc::new(ModelRegistry::new(encoder, classifier.forest, classifier.report));

    // Build application
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .context("Invalid server address")?;
    let state = AppState::new(config, registry, oracle);
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
