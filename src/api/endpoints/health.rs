//! Liveness and welcome endpoints.

use axum::Json;
use serde::Serialize;

use crate::config::{API_VERSION, SERVICE_NAME};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

#[derive(Serialize)]
pub struct WelcomeResponse {
    pub message: String,
    pub version: &'static str,
}

/// GET /health
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
    })
}

/// GET /
pub async fn welcome() -> Json<WelcomeResponse> {
    Json(WelcomeResponse {
        message: format!("{SERVICE_NAME} thumbnail analysis API"),
        version: API_VERSION,
    })
}
