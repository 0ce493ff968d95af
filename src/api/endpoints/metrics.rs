//! Usage metrics endpoint.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;
use crate::config::API_VERSION;
use crate::predictor::ModelInfo;

#[derive(Serialize)]
pub struct MetricsResponse {
    pub total_analyses: u64,
    pub average_score: f64,
    pub api_version: &'static str,
    pub model: ModelInfo,
}

/// GET /metrics
pub async fn report(State(ctx): State<ApiContext>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_analyses: ctx.analyzer.total_analyses(),
        average_score: ctx.analyzer.average_score(),
        api_version: API_VERSION,
        model: ctx.analyzer.model_info(),
    })
}
