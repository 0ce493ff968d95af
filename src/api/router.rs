//! API router assembly.
//!
//! Returns a composable `Router` that can be mounted on any axum server.

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;

use crate::analyzer::ThumbnailAnalyzer;
use crate::api::endpoints;
use crate::api::types::ApiContext;
use crate::config::Settings;

/// Build the service router.
///
/// CORS is fully permissive: the API serves browser dashboards on
/// arbitrary origins. The body limit leaves multipart framing headroom
/// above the configured per-image cap; the per-image cap itself is
/// enforced in the handlers.
pub fn api_router(analyzer: Arc<ThumbnailAnalyzer>, settings: Arc<Settings>) -> Router {
    let body_limit = settings.max_image_bytes.saturating_mul(2);
    let ctx = ApiContext::new(analyzer, settings);

    Router::new()
        .route("/", get(endpoints::health::welcome))
        .route("/health", get(endpoints::health::check))
        .route("/analyze", post(endpoints::analyze::single))
        .route("/batch-analyze", post(endpoints::analyze::batch))
        .route("/metrics", get(endpoints::metrics::report))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
}
