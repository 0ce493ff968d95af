//! Learned regression head for appeal scoring.
//!
//! A deliberately small model: mean-pooled RGB patches feed one dense
//! layer with a sigmoid output in [0,1]. Parameters persist as JSON so a
//! deployment can drop in a trained file without a native tensor runtime.
//!
//! Training is plain full-batch gradient descent with the two usual
//! regression guards: early stopping on validation loss and halving the
//! learning rate on plateau.

use std::fs;
use std::path::Path;

use ndarray::{Array1, ArrayView3};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Pooling grid edge: the image collapses to POOL×POOL×3 features.
const POOL: usize = 8;

/// Maximum training epochs.
const MAX_EPOCHS: usize = 50;

/// Initial learning rate.
const INITIAL_LR: f64 = 0.05;

/// Early stopping patience (epochs without validation improvement).
const EARLY_STOP_PATIENCE: usize = 5;

/// Learning-rate decay patience.
const LR_PLATEAU_PATIENCE: usize = 3;

/// Train/validation split fraction.
const TRAIN_FRACTION: f64 = 0.8;

/// Errors from model persistence and inference.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("model io failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("model file malformed: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("model incompatible: {0}")]
    Incompatible(String),
    #[error("input has no pixels")]
    EmptyInput,
}

/// Errors from training.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    #[error("images and scores differ in length: {images} vs {scores}")]
    MismatchedLengths { images: usize, scores: usize },
    #[error("need at least {needed} samples, got {got}")]
    NotEnoughSamples { needed: usize, got: usize },
    #[error("target score {0} outside 0-100")]
    TargetOutOfRange(f64),
}

/// On-disk parameter format.
#[derive(Serialize, Deserialize)]
struct ModelFile {
    pool: usize,
    weights: Vec<f64>,
    bias: f64,
}

/// Linear-with-sigmoid regression over pooled RGB features.
#[derive(Debug, Clone)]
pub struct RegressionModel {
    weights: Array1<f64>,
    bias: f64,
}

impl Default for RegressionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RegressionModel {
    /// Fresh zero-initialized model (sigmoid(0) = 0.5 → score 50).
    pub fn new() -> Self {
        Self {
            weights: Array1::zeros(POOL * POOL * 3),
            bias: 0.0,
        }
    }

    /// Number of trainable parameters.
    pub fn parameter_count(&self) -> usize {
        self.weights.len() + 1
    }

    /// Feature vector length the model expects.
    pub fn input_len(&self) -> usize {
        self.weights.len()
    }

    // ── Inference ───────────────────────────────────────────

    /// Forward pass: pooled features → sigmoid, output in [0,1].
    pub fn forward(&self, pixels: &ArrayView3<'_, f32>) -> Result<f64, ModelError> {
        let features = pool_features(pixels).ok_or(ModelError::EmptyInput)?;
        Ok(sigmoid(self.weights.dot(&features) + self.bias))
    }

    // ── Training ────────────────────────────────────────────

    /// Fit the model on parallel image/score arrays.
    ///
    /// Targets are 0–100, normalized internally. The split is 80/20 in
    /// array order — callers wanting a shuffled split shuffle upstream.
    /// Returns the best validation loss reached.
    pub fn train(
        &mut self,
        images: &[ArrayView3<'_, f32>],
        scores: &[f64],
    ) -> Result<f64, TrainingError> {
        if images.len() != scores.len() {
            return Err(TrainingError::MismatchedLengths {
                images: images.len(),
                scores: scores.len(),
            });
        }
        if images.len() < 2 {
            return Err(TrainingError::NotEnoughSamples {
                needed: 2,
                got: images.len(),
            });
        }
        if let Some(&bad) = scores.iter().find(|s| !(0.0..=100.0).contains(*s)) {
            return Err(TrainingError::TargetOutOfRange(bad));
        }

        let features: Vec<Array1<f64>> = images
            .iter()
            .map(|img| pool_features(img).unwrap_or_else(|| Array1::zeros(self.input_len())))
            .collect();
        let targets: Vec<f64> = scores.iter().map(|s| s / 100.0).collect();

        // Ordered split; validation gets at least one sample
        let split = ((images.len() as f64 * TRAIN_FRACTION) as usize)
            .clamp(1, images.len() - 1);
        let (train_x, val_x) = features.split_at(split);
        let (train_y, val_y) = targets.split_at(split);

        let mut lr = INITIAL_LR;
        let mut best_loss = f64::INFINITY;
        let mut best_weights = self.weights.clone();
        let mut best_bias = self.bias;
        let mut epochs_since_best = 0usize;
        let mut epochs_since_decay = 0usize;

        for epoch in 0..MAX_EPOCHS {
            self.gradient_step(train_x, train_y, lr);

            let val_loss = self.mse(val_x, val_y);
            debug!(epoch, val_loss, lr, "Training epoch");

            if val_loss + f64::EPSILON < best_loss {
                best_loss = val_loss;
                best_weights = self.weights.clone();
                best_bias = self.bias;
                epochs_since_best = 0;
                epochs_since_decay = 0;
            } else {
                epochs_since_best += 1;
                epochs_since_decay += 1;
            }

            if epochs_since_best >= EARLY_STOP_PATIENCE {
                debug!(epoch, "Early stopping");
                break;
            }
            if epochs_since_decay >= LR_PLATEAU_PATIENCE {
                lr *= 0.5;
                epochs_since_decay = 0;
                debug!(lr, "Learning rate reduced on plateau");
            }
        }

        // Restore best weights (mirrors restore_best_weights semantics)
        self.weights = best_weights;
        self.bias = best_bias;

        info!(
            samples = images.len(),
            validation_loss = best_loss,
            "Model training finished"
        );
        Ok(best_loss)
    }

    /// One full-batch gradient descent step on MSE loss.
    fn gradient_step(&mut self, xs: &[Array1<f64>], ys: &[f64], lr: f64) {
        let n = xs.len() as f64;
        let mut grad_w = Array1::<f64>::zeros(self.weights.len());
        let mut grad_b = 0.0;

        for (x, &y) in xs.iter().zip(ys) {
            let p = sigmoid(self.weights.dot(x) + self.bias);
            // d/dz of MSE through sigmoid
            let delta = 2.0 * (p - y) * p * (1.0 - p);
            grad_w.scaled_add(delta, x);
            grad_b += delta;
        }

        self.weights.scaled_add(-lr / n, &grad_w);
        self.bias -= lr / n * grad_b;
    }

    /// Mean squared error over a sample set.
    fn mse(&self, xs: &[Array1<f64>], ys: &[f64]) -> f64 {
        if xs.is_empty() {
            return 0.0;
        }
        let sum: f64 = xs
            .iter()
            .zip(ys)
            .map(|(x, &y)| {
                let p = sigmoid(self.weights.dot(x) + self.bias);
                (p - y) * (p - y)
            })
            .sum();
        sum / xs.len() as f64
    }

    // ── Persistence ─────────────────────────────────────────

    /// Persist parameters as JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = ModelFile {
            pool: POOL,
            weights: self.weights.to_vec(),
            bias: self.bias,
        };
        fs::write(path, serde_json::to_vec_pretty(&file)?)?;
        info!(path = %path.display(), "Model saved");
        Ok(())
    }

    /// Load parameters from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let raw = fs::read(path)?;
        let file: ModelFile = serde_json::from_slice(&raw)?;
        if file.pool != POOL {
            return Err(ModelError::Incompatible(format!(
                "pool grid {} does not match expected {POOL}",
                file.pool
            )));
        }
        if file.weights.len() != POOL * POOL * 3 {
            return Err(ModelError::Incompatible(format!(
                "weight count {} does not match expected {}",
                file.weights.len(),
                POOL * POOL * 3
            )));
        }
        Ok(Self {
            weights: Array1::from_vec(file.weights),
            bias: file.bias,
        })
    }
}

/// Mean-pool the image onto a POOL×POOL grid per channel.
/// Returns `None` for an empty image.
fn pool_features(pixels: &ArrayView3<'_, f32>) -> Option<Array1<f64>> {
    let (h, w, _) = pixels.dim();
    if h == 0 || w == 0 {
        return None;
    }

    let mut features = Array1::<f64>::zeros(POOL * POOL * 3);
    let mut counts = vec![0u32; POOL * POOL];

    for y in 0..h {
        let gy = (y * POOL / h).min(POOL - 1);
        for x in 0..w {
            let gx = (x * POOL / w).min(POOL - 1);
            let cell = gy * POOL + gx;
            counts[cell] += 1;
            for c in 0..3 {
                features[cell * 3 + c] += f64::from(pixels[[y, x, c]]);
            }
        }
    }

    for cell in 0..POOL * POOL {
        if counts[cell] > 0 {
            for c in 0..3 {
                features[cell * 3 + c] /= f64::from(counts[cell]);
            }
        }
    }

    Some(features)
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}
