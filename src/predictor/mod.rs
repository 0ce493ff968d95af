//! Appeal score prediction.
//!
//! Two backends behind one type: a closed-form heuristic (the shipping
//! default) and a learned regression head loaded from disk when a model
//! file exists. Loading never fails the service; a missing or broken
//! model file just leaves the heuristic active.

pub mod heuristic;
pub mod model;

use std::path::Path;

use ndarray::ArrayView3;
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

pub use model::{ModelError, RegressionModel, TrainingError};

/// Jitter bound for the heuristic path.
const JITTER_RANGE: f64 = 5.0;

/// Score prediction backend.
#[derive(Debug)]
pub enum ScorePredictor {
    /// Closed-form formula, no trained parameters.
    Heuristic,
    /// Trained regression head.
    Learned(RegressionModel),
}

/// Backend description for the info endpoint.
#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub status: &'static str,
    pub parameter_count: usize,
    pub input_shape: [usize; 3],
}

impl ScorePredictor {
    /// Load from a model file, falling back to the heuristic.
    ///
    /// A missing file is the normal first-boot state and logs at info;
    /// a present-but-unreadable file logs a warning. Neither is fatal.
    pub fn from_model_path(path: &Path) -> Self {
        match RegressionModel::load(path) {
            Ok(model) => {
                info!(
                    path = %path.display(),
                    parameters = model.parameter_count(),
                    "Loaded trained score model"
                );
                Self::Learned(model)
            }
            Err(ModelError::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "No trained model found, using heuristic scoring"
                );
                Self::Heuristic
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Model load failed, using heuristic scoring"
                );
                Self::Heuristic
            }
        }
    }

    pub fn is_trained(&self) -> bool {
        matches!(self, Self::Learned(_))
    }

    /// Predict an appeal score in [0, 100], rounded to one decimal.
    ///
    /// The RNG only feeds the heuristic jitter; the learned path is
    /// deterministic. A learned forward failure degrades to the
    /// heuristic rather than erroring.
    pub fn predict<R: Rng>(&self, pixels: &ArrayView3<'_, f32>, rng: &mut R) -> f64 {
        let score = match self {
            Self::Learned(model) => match model.forward(pixels) {
                Ok(unit) => (unit * 100.0).clamp(0.0, 100.0),
                Err(err) => {
                    warn!(error = %err, "Model inference failed, falling back to heuristic");
                    self.heuristic_with_jitter(pixels, rng)
                }
            },
            Self::Heuristic => self.heuristic_with_jitter(pixels, rng),
        };
        (score * 10.0).round() / 10.0
    }

    fn heuristic_with_jitter<R: Rng>(&self, pixels: &ArrayView3<'_, f32>, rng: &mut R) -> f64 {
        let jitter = rng.gen_range(-JITTER_RANGE..=JITTER_RANGE);
        heuristic::heuristic_score(pixels, jitter)
    }

    /// Train a fresh model on labeled samples and promote to it.
    ///
    /// Returns `true` on success. On failure the current backend stays
    /// active.
    pub fn train(&mut self, images: &[ArrayView3<'_, f32>], scores: &[f64]) -> bool {
        let mut model = match self {
            Self::Learned(existing) => existing.clone(),
            Self::Heuristic => RegressionModel::new(),
        };
        match model.train(images, scores) {
            Ok(_) => {
                *self = Self::Learned(model);
                true
            }
            Err(err) => {
                warn!(error = %err, "Model training failed");
                false
            }
        }
    }

    /// Persist the trained model. Returns `false` for the heuristic
    /// backend or on IO failure.
    pub fn save(&self, path: &Path) -> bool {
        match self {
            Self::Learned(model) => match model.save(path) {
                Ok(()) => true,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "Model save failed");
                    false
                }
            },
            Self::Heuristic => {
                warn!("No trained model to save");
                false
            }
        }
    }

    /// Describe the active backend.
    pub fn model_info(&self) -> ModelInfo {
        match self {
            Self::Learned(model) => ModelInfo {
                status: "trained",
                parameter_count: model.parameter_count(),
                input_shape: [
                    crate::preprocess::DEFAULT_TARGET_SIZE as usize,
                    crate::preprocess::DEFAULT_TARGET_SIZE as usize,
                    3,
                ],
            },
            Self::Heuristic => ModelInfo {
                status: "heuristic",
                parameter_count: 0,
                input_shape: [
                    crate::preprocess::DEFAULT_TARGET_SIZE as usize,
                    crate::preprocess::DEFAULT_TARGET_SIZE as usize,
                    3,
                ],
            },
        }
    }
}
