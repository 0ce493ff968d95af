//! Feature extraction over the preprocessed pixel array.
//!
//! Produces the basic 0–100 feature scores consumed by fusion, plus an
//! extended metric map for diagnostics. Per-metric failures never abort
//! an analysis: each score records whether it was computed or replaced
//! by a documented default, so callers can tell "computed 0.0" apart
//! from "failed, used default 0.0".

pub mod composition;
pub mod harmony;
pub mod stats;

use std::collections::BTreeMap;

use ndarray::ArrayView3;
use rand::Rng;
use tracing::warn;

/// Laplacian-variance divisor that maps raw sharpness onto a unit scale.
const CLARITY_NORMALIZER: f64 = 10_000.0;

/// Canny-style edge detector thresholds on the 0–255 scale.
const EDGE_WEAK_THRESHOLD: f64 = 50.0;
const EDGE_STRONG_THRESHOLD: f64 = 150.0;

// ═══════════════════════════════════════════════════════════
// Per-metric outcome tracking
// ═══════════════════════════════════════════════════════════

/// How a metric value was obtained.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSource {
    Computed,
    Defaulted { reason: String },
}

/// A feature score with provenance.
#[derive(Debug, Clone)]
pub struct Metric {
    pub value: f64,
    pub source: MetricSource,
}

impl Metric {
    pub fn computed(value: f64) -> Self {
        Self {
            value,
            source: MetricSource::Computed,
        }
    }

    pub fn defaulted(value: f64, reason: impl Into<String>) -> Self {
        Self {
            value,
            source: MetricSource::Defaulted {
                reason: reason.into(),
            },
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self.source, MetricSource::Defaulted { .. })
    }
}

// ═══════════════════════════════════════════════════════════
// Basic feature scores
// ═══════════════════════════════════════════════════════════

/// The 0–100 feature scores that drive fusion and suggestions.
#[derive(Debug, Clone)]
pub struct BasicFeatures {
    /// 0.3·contrast + 0.3·saturation + 0.4·clarity on the unit scale,
    /// then ×100 and capped.
    pub visual_impact: Metric,
    /// Laplacian variance / 10 000, ×100, capped.
    pub clarity: Metric,
    /// Grayscale standard deviation on the unit scale, ×100, capped.
    pub contrast: Metric,
    /// k-means palette balance, already 0–100.
    pub color_harmony: Metric,
    /// Mean L* lightness, 0–100.
    pub brightness: Metric,
    /// Mean HSV saturation ×100.
    pub saturation: Metric,
}

/// Compute the basic feature scores.
///
/// The RNG seeds the k-means restarts for the harmony score; pass a
/// seeded `StdRng` for reproducible results.
pub fn compute_basic<R: Rng>(pixels: &ArrayView3<'_, f32>, rng: &mut R) -> BasicFeatures {
    let gray = stats::grayscale(pixels);

    let contrast_unit = stats::std_dev(&gray) / 255.0;
    let saturation_unit = stats::mean_saturation(pixels);
    let brightness = stats::mean_lightness(pixels);
    let clarity_unit = stats::laplacian_variance(&gray) / CLARITY_NORMALIZER;

    let color_harmony = match harmony::color_harmony(pixels, rng) {
        Some(score) => Metric::computed(score),
        None => {
            warn!("Color harmony unavailable, defaulting to 0");
            Metric::defaulted(0.0, "k-means produced no clusters")
        }
    };

    // Contrast and clarity feed visual impact AND stand alone in the
    // fusion weights. The double-counting is intentional; the final
    // weights were tuned against this exact nesting.
    let visual_impact_unit =
        contrast_unit * 0.3 + saturation_unit * 0.3 + clarity_unit * 0.4;

    BasicFeatures {
        visual_impact: Metric::computed((visual_impact_unit * 100.0).min(100.0)),
        clarity: Metric::computed((clarity_unit * 100.0).min(100.0)),
        contrast: Metric::computed((contrast_unit * 100.0).min(100.0)),
        color_harmony,
        brightness: Metric::computed(brightness),
        saturation: Metric::computed(saturation_unit * 100.0),
    }
}

// ═══════════════════════════════════════════════════════════
// Extended metric map (diagnostics)
// ═══════════════════════════════════════════════════════════

/// Compute the full named-metric map.
///
/// Values follow the 8-bit conventions of the tooling the thresholds came
/// from: hue 0–180, saturation/value/lightness 0–255, contrast/brightness
/// on the 0–255 intensity scale. Returns an empty map when the image has
/// no pixels.
pub fn extract_metrics(pixels: &ArrayView3<'_, f32>) -> BTreeMap<&'static str, f64> {
    let (h, w, _) = pixels.dim();
    let mut metrics = BTreeMap::new();
    if h == 0 || w == 0 {
        warn!("Metric extraction on empty image, returning empty map");
        return metrics;
    }

    let gray = stats::grayscale(pixels);
    let (mean_hue, mean_saturation, mean_value) = stats::hsv_channel_means(pixels);

    metrics.insert("mean_hue", mean_hue);
    metrics.insert("mean_saturation", mean_saturation);
    metrics.insert("mean_value", mean_value);
    metrics.insert("mean_lightness", stats::mean_lightness(pixels) * 2.55);
    metrics.insert("contrast", stats::std_dev(&gray));
    metrics.insert("brightness", stats::mean(&gray));
    metrics.insert("sharpness", stats::laplacian_variance(&gray));
    metrics.insert(
        "edge_density",
        stats::edge_density(&gray, EDGE_WEAK_THRESHOLD, EDGE_STRONG_THRESHOLD),
    );
    metrics.insert("color_variance_r", stats::channel_histogram_variance(pixels, 0));
    metrics.insert("color_variance_g", stats::channel_histogram_variance(pixels, 1));
    metrics.insert("color_variance_b", stats::channel_histogram_variance(pixels, 2));

    metrics
}
