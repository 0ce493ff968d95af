//! ThumbScore: video thumbnail appeal scoring service.
//!
//! Pipeline: preprocess (letterbox to a square float canvas) → feature
//! extraction (contrast, clarity, color harmony, composition) → score
//! prediction (heuristic or learned) → contextual scoring → weighted
//! fusion → suggestions, exposed over an axum HTTP API.

pub mod analyzer;
pub mod api;
pub mod config;
pub mod contextual;
pub mod features;
pub mod fusion;
pub mod predictor;
pub mod preprocess;
