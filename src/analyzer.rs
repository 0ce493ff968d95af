//! End-to-end thumbnail analysis.
//!
//! Owns the full pipeline: preprocess → features → prediction →
//! contextual scoring → fusion → suggestions, plus the usage counters
//! the metrics endpoint reports. One instance is shared across all
//! request handlers.

use std::sync::{Mutex, RwLock};

use chrono::Utc;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use tracing::{debug, info};

use crate::contextual::{ContextualScorer, PlaceholderContextualScorer};
use crate::features::{self, composition};
use crate::fusion;
use crate::predictor::{ModelInfo, ScorePredictor};
use crate::preprocess::{self, PreprocessError, PreprocessOptions};

/// Errors an analysis can surface to callers.
#[derive(Debug, thiserror::Error)]
pub enum AnalysisError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
}

/// Per-dimension scores reported alongside the final score.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreBreakdown {
    pub visual_impact: f64,
    pub clarity: f64,
    pub contrast: f64,
    pub color_harmony: f64,
    pub composition: f64,
    pub text_readability: f64,
}

/// Full result of one analysis.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub score: f64,
    pub breakdown: ScoreBreakdown,
    pub suggestions: Vec<String>,
    pub analysis_timestamp: String,
    pub filename: String,
}

/// Running usage record for the metrics endpoint: the ordered history
/// of final scores, one entry per completed analysis.
#[derive(Debug, Default)]
struct UsageStats {
    scores: Vec<f64>,
}

/// Shared analysis pipeline.
pub struct ThumbnailAnalyzer {
    options: PreprocessOptions,
    predictor: RwLock<ScorePredictor>,
    contextual: Box<dyn ContextualScorer>,
    rng: Mutex<StdRng>,
    stats: Mutex<UsageStats>,
}

impl ThumbnailAnalyzer {
    /// Build with the given predictor and the stand-in contextual scorer.
    pub fn new(predictor: ScorePredictor) -> Self {
        Self::with_contextual(predictor, Box::new(PlaceholderContextualScorer::new()))
    }

    /// Build with an explicit contextual backend.
    pub fn with_contextual(
        predictor: ScorePredictor,
        contextual: Box<dyn ContextualScorer>,
    ) -> Self {
        Self {
            options: PreprocessOptions::default(),
            predictor: RwLock::new(predictor),
            contextual,
            rng: Mutex::new(StdRng::from_entropy()),
            stats: Mutex::new(UsageStats::default()),
        }
    }

    /// Fully deterministic analyzer for tests.
    #[cfg(test)]
    pub fn seeded(predictor: ScorePredictor, seed: u64) -> Self {
        Self {
            options: PreprocessOptions::default(),
            predictor: RwLock::new(predictor),
            contextual: Box::new(PlaceholderContextualScorer::seeded(seed)),
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            stats: Mutex::new(UsageStats::default()),
        }
    }

    /// Analyze one encoded image.
    ///
    /// Decode failures propagate; every downstream stage recovers with
    /// documented defaults instead of failing the request.
    pub fn analyze(&self, bytes: &[u8], filename: &str) -> Result<AnalysisReport, AnalysisError> {
        let pixels = preprocess::preprocess(bytes, &self.options)?;
        let view = pixels.view();

        let basic = {
            let mut rng = lock_unpoisoned(&self.rng);
            features::compute_basic(&view, &mut *rng)
        };

        let ml_score = {
            let predictor = match self.predictor.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let mut rng = lock_unpoisoned(&self.rng);
            predictor.predict(&view, &mut *rng)
        };

        let contextual = self.contextual.score(&view);

        let grid = composition::analyze(&view);
        debug!(
            filename,
            grid_score = grid.composition_score,
            thirds_adherence = grid.rule_of_thirds_adherence,
            metrics = ?features::extract_metrics(&view),
            "Diagnostic metrics"
        );

        let basic_agg = fusion::basic_aggregate(&basic);
        let ctx_agg = fusion::contextual_aggregate(&contextual);
        let score = fusion::final_score(basic_agg, ml_score, ctx_agg);
        let suggestions = fusion::suggestions(&basic, &contextual, score);

        {
            let mut stats = lock_unpoisoned(&self.stats);
            stats.scores.push(score);
        }

        info!(filename, score, "Thumbnail analyzed");

        Ok(AnalysisReport {
            score,
            breakdown: ScoreBreakdown {
                visual_impact: round1(basic.visual_impact.value),
                clarity: round1(basic.clarity.value),
                contrast: round1(basic.contrast.value),
                color_harmony: round1(basic.color_harmony.value),
                composition: round1(contextual.composition),
                text_readability: round1(contextual.text_readability),
            },
            suggestions,
            analysis_timestamp: Utc::now().to_rfc3339(),
            filename: filename.to_string(),
        })
    }

    /// Number of analyses completed since startup.
    pub fn total_analyses(&self) -> u64 {
        lock_unpoisoned(&self.stats).scores.len() as u64
    }

    /// Mean of all recorded final scores, rounded to one decimal.
    /// 0.0 before the first analysis.
    pub fn average_score(&self) -> f64 {
        let stats = lock_unpoisoned(&self.stats);
        if stats.scores.is_empty() {
            return 0.0;
        }
        round1(stats.scores.iter().sum::<f64>() / stats.scores.len() as f64)
    }

    /// Describe the active prediction backend.
    pub fn model_info(&self) -> ModelInfo {
        match self.predictor.read() {
            Ok(guard) => guard.model_info(),
            Err(poisoned) => poisoned.into_inner().model_info(),
        }
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};
    use std::io::Cursor;

    fn encoded_test_image(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            image::Rgb([
                ((x * 5 + y) % 256) as u8,
                ((y * 3) % 256) as u8,
                ((x + y * 7) % 256) as u8,
            ])
        });
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn analysis_produces_a_complete_report() {
        let analyzer = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 42);
        let report = analyzer
            .analyze(&encoded_test_image(320, 180), "thumb.png")
            .unwrap();

        assert!((0.0..=100.0).contains(&report.score));
        assert_eq!(report.filename, "thumb.png");
        assert!(!report.suggestions.is_empty());
        assert!(report.analysis_timestamp.contains('T'));

        let b = &report.breakdown;
        for value in [
            b.visual_impact,
            b.clarity,
            b.contrast,
            b.color_harmony,
            b.composition,
            b.text_readability,
        ] {
            assert!((0.0..=100.0).contains(&value), "breakdown value {value}");
        }
    }

    #[test]
    fn garbage_bytes_fail_with_preprocess_error() {
        let analyzer = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 1);
        let err = analyzer.analyze(&vec![0u8; 256], "bad.png").unwrap_err();
        assert!(matches!(err, AnalysisError::Preprocess(_)));
    }

    #[test]
    fn usage_stats_track_analyses() {
        let analyzer = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 9);
        assert_eq!(analyzer.total_analyses(), 0);
        assert_eq!(analyzer.average_score(), 0.0);

        let bytes = encoded_test_image(160, 90);
        let a = analyzer.analyze(&bytes, "a.png").unwrap();
        assert_eq!(analyzer.total_analyses(), 1);
        let b = analyzer.analyze(&bytes, "b.png").unwrap();
        assert_eq!(analyzer.total_analyses(), 2);
        let c = analyzer.analyze(&bytes, "c.png").unwrap();

        assert_eq!(analyzer.total_analyses(), 3);
        let expected = ((a.score + b.score + c.score) / 3.0 * 10.0).round() / 10.0;
        assert_eq!(analyzer.average_score(), expected);
    }

    #[test]
    fn flat_gray_image_triggers_contrast_and_sharpness_suggestions() {
        let img = RgbImage::from_pixel(128, 128, image::Rgb([128, 128, 128]));
        let mut bytes = Cursor::new(Vec::new());
        img.write_to(&mut bytes, ImageFormat::Png).unwrap();

        let analyzer = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 8);
        let report = analyzer.analyze(&bytes.into_inner(), "flat.png").unwrap();

        assert!(report
            .suggestions
            .iter()
            .any(|s| s == "Increase the contrast to improve readability"));
        assert!(report
            .suggestions
            .iter()
            .any(|s| s == "Use a sharper image for better visual impact"));
    }

    #[test]
    fn failed_analyses_do_not_count() {
        let analyzer = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 3);
        let _ = analyzer.analyze(&vec![1u8; 100], "bad.bin");
        assert_eq!(analyzer.total_analyses(), 0);
    }

    #[test]
    fn same_seed_gives_same_report() {
        let bytes = encoded_test_image(200, 200);
        let a = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 77)
            .analyze(&bytes, "x.png")
            .unwrap();
        let b = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 77)
            .analyze(&bytes, "x.png")
            .unwrap();
        assert_eq!(a.score, b.score);
        assert_eq!(a.suggestions, b.suggestions);
    }

    #[test]
    fn report_serializes_with_expected_keys() {
        let analyzer = ThumbnailAnalyzer::seeded(ScorePredictor::Heuristic, 5);
        let report = analyzer
            .analyze(&encoded_test_image(64, 64), "s.png")
            .unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert!(json.get("score").is_some());
        assert!(json.get("analysis_timestamp").is_some());
        let breakdown = json.get("breakdown").unwrap();
        for key in [
            "visual_impact",
            "clarity",
            "contrast",
            "color_harmony",
            "composition",
            "text_readability",
        ] {
            assert!(breakdown.get(key).is_some(), "missing {key}");
        }
    }
}
