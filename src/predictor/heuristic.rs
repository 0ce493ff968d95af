//! Closed-form fallback scoring formula.
//!
//! Used whenever no trained model is available (the shipping default) or
//! when a model forward pass fails. This is the scoring function tests
//! should pin down: pass `jitter = 0.0` for deterministic output.

use ndarray::ArrayView3;

use crate::features::stats;

/// Weight of the contrast term.
const W_CONTRAST: f64 = 25.0;
/// Weight of the brightness-centeredness term.
const W_BRIGHTNESS: f64 = 20.0;
/// Weight of the gradient sharpness term.
const W_SHARPNESS: f64 = 30.0;
/// Weight of the saturation term.
const W_SATURATION: f64 = 25.0;

/// Clamp bounds keeping the fallback in a realistic band.
const SCORE_FLOOR: f64 = 50.0;
const SCORE_CEIL: f64 = 95.0;

/// Score an image with the heuristic formula.
///
/// `jitter` is added before clamping; the caller draws it from a seeded
/// RNG in [−5, +5] to mimic model variance, or passes 0.0 in tests.
/// Output always lies in [50, 95].
pub fn heuristic_score(pixels: &ArrayView3<'_, f32>, jitter: f64) -> f64 {
    let gray = stats::channel_mean_gray(pixels);

    let contrast = stats::std_dev(&gray);

    // Peaks at mid-gray, falls off linearly toward black or white
    let brightness = stats::mean(&gray);
    let brightness_score = 1.0 - (brightness - 0.5).abs() * 2.0;

    let sharpness = stats::mean_gradient_magnitude(&gray);

    let saturation = stats::mean_saturation(pixels);

    let score = contrast * W_CONTRAST
        + brightness_score * W_BRIGHTNESS
        + sharpness * W_SHARPNESS
        + saturation * W_SATURATION
        + jitter;

    score.clamp(SCORE_FLOOR, SCORE_CEIL)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::stats::uniform_pixels;
    use ndarray::Array3;

    #[test]
    fn all_black_image_hits_the_floor() {
        let pixels = uniform_pixels(32, 32, 0.0);
        assert_eq!(heuristic_score(&pixels.view(), 0.0), 50.0);
    }

    #[test]
    fn all_white_image_hits_the_floor() {
        let pixels = uniform_pixels(32, 32, 1.0);
        assert_eq!(heuristic_score(&pixels.view(), 0.0), 50.0);
    }

    #[test]
    fn mid_gray_earns_only_the_brightness_term() {
        // contrast 0, sharpness 0, saturation 0, brightness score 1 → 20,
        // below the floor → clamped to 50
        let pixels = uniform_pixels(32, 32, 0.5);
        assert_eq!(heuristic_score(&pixels.view(), 0.0), 50.0);
    }

    #[test]
    fn saturated_stripes_score_above_floor() {
        // 2-pixel yellow/blue stripes: gray means 2/3 and 1/3, so
        // brightness centers on 0.5 (term 20), contrast std is 1/6
        // (term ~4.2), every interior gradient is 1/6 (term 5), and
        // both colors are fully saturated (term 25) — ~54.2 total,
        // clear of the 50 floor
        let mut pixels = Array3::<f32>::zeros((32, 32, 3));
        for y in 0..32 {
            for x in 0..32 {
                if (x / 2) % 2 == 0 {
                    pixels[[y, x, 0]] = 1.0;
                    pixels[[y, x, 1]] = 1.0;
                } else {
                    pixels[[y, x, 2]] = 1.0;
                }
            }
        }
        let score = heuristic_score(&pixels.view(), 0.0);
        assert!(score > 52.0, "got {score}");
        assert!(score < 60.0, "got {score}");
    }

    #[test]
    fn jitterless_score_bounded_for_arbitrary_inputs() {
        for seed in 0..10u32 {
            let mut pixels = Array3::<f32>::zeros((24, 24, 3));
            for y in 0..24 {
                for x in 0..24 {
                    for c in 0..3 {
                        let v = ((x * 7 + y * 13 + c * 29 + seed as usize * 31) % 256) as f32 / 255.0;
                        pixels[[y, x, c]] = v;
                    }
                }
            }
            let score = heuristic_score(&pixels.view(), 0.0);
            assert!((50.0..=95.0).contains(&score), "seed {seed}: {score}");
        }
    }

    #[test]
    fn extreme_jitter_is_still_clamped() {
        let pixels = uniform_pixels(16, 16, 0.5);
        assert_eq!(heuristic_score(&pixels.view(), 1000.0), 95.0);
        assert_eq!(heuristic_score(&pixels.view(), -1000.0), 50.0);
    }
}
