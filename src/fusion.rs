//! Score fusion and suggestion generation.
//!
//! Combines the basic feature scores, the model prediction, and the
//! contextual scores into one 0–100 appeal score, then derives
//! actionable suggestions from the weakest dimensions.

use crate::contextual::ContextualScores;
use crate::features::BasicFeatures;

// ── Fusion weights ──────────────────────────────────────────

const W_VISUAL_IMPACT: f64 = 0.3;
const W_CLARITY: f64 = 0.25;
const W_CONTRAST: f64 = 0.25;
const W_HARMONY: f64 = 0.2;

const W_CTX_COMPOSITION: f64 = 0.4;
const W_CTX_TEXT: f64 = 0.3;
const W_CTX_EMOTION: f64 = 0.3;

const W_FINAL_BASIC: f64 = 0.4;
const W_FINAL_MODEL: f64 = 0.35;
const W_FINAL_CONTEXT: f64 = 0.25;

// ── Suggestion thresholds ───────────────────────────────────

const CONTRAST_THRESHOLD: f64 = 60.0;
const CLARITY_THRESHOLD: f64 = 50.0;
const HARMONY_THRESHOLD: f64 = 70.0;
const COMPOSITION_THRESHOLD: f64 = 70.0;
const TEXT_THRESHOLD: f64 = 75.0;

const TIER_EXCELLENT: f64 = 85.0;
const TIER_GOOD: f64 = 70.0;

/// Aggregate the basic feature scores.
///
/// Visual impact already folds in contrast and clarity; they appear
/// again here with their own weights. Intentional: the weights were
/// tuned against this nesting.
pub fn basic_aggregate(features: &BasicFeatures) -> f64 {
    features.visual_impact.value * W_VISUAL_IMPACT
        + features.clarity.value * W_CLARITY
        + features.contrast.value * W_CONTRAST
        + features.color_harmony.value * W_HARMONY
}

/// Aggregate the contextual scores. Brand consistency is reported but
/// carries no weight in the appeal score.
pub fn contextual_aggregate(scores: &ContextualScores) -> f64 {
    scores.composition * W_CTX_COMPOSITION
        + scores.text_readability * W_CTX_TEXT
        + scores.emotional_appeal * W_CTX_EMOTION
}

/// Fuse the three aggregates into the final appeal score.
///
/// Capped above at 100 and rounded to one decimal. There is no lower
/// clamp: the inputs are already non-negative in practice.
pub fn final_score(basic: f64, model: f64, contextual: f64) -> f64 {
    let fused =
        (basic * W_FINAL_BASIC + model * W_FINAL_MODEL + contextual * W_FINAL_CONTEXT).min(100.0);
    (fused * 10.0).round() / 10.0
}

/// Derive improvement suggestions from the weakest dimensions.
///
/// Rules fire in a fixed order so output is stable for a given input;
/// the list always ends with an overall remark tiered on the final
/// score.
pub fn suggestions(
    features: &BasicFeatures,
    contextual: &ContextualScores,
    score: f64,
) -> Vec<String> {
    let mut out = Vec::new();

    if features.contrast.value < CONTRAST_THRESHOLD {
        out.push("Increase the contrast to improve readability".to_string());
    }
    if features.clarity.value < CLARITY_THRESHOLD {
        out.push("Use a sharper image for better visual impact".to_string());
    }
    if features.color_harmony.value < HARMONY_THRESHOLD {
        out.push("Consider using a more harmonious color palette".to_string());
    }
    if contextual.composition < COMPOSITION_THRESHOLD {
        out.push("Improve the composition by following the rule of thirds".to_string());
    }
    if contextual.text_readability < TEXT_THRESHOLD {
        out.push("Make the text more legible with better contrast or size".to_string());
    }

    let remark = if score > TIER_EXCELLENT {
        "Excellent thumbnail! Small adjustments can make it even better"
    } else if score > TIER_GOOD {
        "Good thumbnail! A few improvements can raise the click-through rate"
    } else {
        "This thumbnail needs significant improvements to perform better"
    };
    out.push(remark.to_string());

    out
}
