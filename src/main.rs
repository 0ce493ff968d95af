//! Service entry point: config → tracing → analyzer → HTTP server.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use thumbscore::analyzer::ThumbnailAnalyzer;
use thumbscore::api::router::api_router;
use thumbscore::config::{Settings, SERVICE_NAME};
use thumbscore::predictor::ScorePredictor;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let settings = Settings::from_env();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let predictor = ScorePredictor::from_model_path(&settings.model_path);
    let analyzer = Arc::new(ThumbnailAnalyzer::new(predictor));
    let settings = Arc::new(settings);

    let app = api_router(analyzer, settings.clone());

    let listener = tokio::net::TcpListener::bind(settings.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, service = SERVICE_NAME, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to install shutdown handler");
        return;
    }
    info!("Shutdown signal received");
}
