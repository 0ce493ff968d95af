//! Rule-of-thirds composition analysis over a 3×3 grid.
//!
//! Each grid cell's intensity variance stands in for visual "interest".
//! A thumbnail whose interest sits on the third lines rather than dead
//! center scores higher.

use ndarray::ArrayView3;
use tracing::warn;

use super::stats;

/// Stabilizer for the center-interest division.
const CENTER_EPSILON: f64 = 1e-6;

/// Composition score ceiling.
const SCORE_CAP: f64 = 2.0;

/// Cell indices in row-major order: 4 is the center,
/// 1/3/5/7 are the edge-middle ("thirds") cells.
const THIRDS_CELLS: [usize; 4] = [1, 3, 5, 7];

/// Result of the 3×3 grid analysis.
#[derive(Debug, Clone)]
pub struct CompositionAnalysis {
    /// Thirds interest relative to center interest, capped at 2.0.
    pub composition_score: f64,
    /// Intensity variance of the center cell.
    pub center_interest: f64,
    /// Thirds interest relative to the most interesting cell, in [0,1].
    pub rule_of_thirds_adherence: f64,
    /// All 9 cell variances, row-major.
    pub cell_variances: Vec<f64>,
}

impl CompositionAnalysis {
    /// Documented fallback when the grid cannot be computed.
    fn fallback() -> Self {
        Self {
            composition_score: 1.0,
            center_interest: 0.0,
            rule_of_thirds_adherence: 0.5,
            cell_variances: Vec::new(),
        }
    }
}

/// Analyze composition; degrades to neutral defaults on failure.
pub fn analyze(pixels: &ArrayView3<'_, f32>) -> CompositionAnalysis {
    match try_analyze(pixels) {
        Ok(analysis) => analysis,
        Err(reason) => {
            warn!(reason, "Composition analysis failed, using defaults");
            CompositionAnalysis::fallback()
        }
    }
}

fn try_analyze(pixels: &ArrayView3<'_, f32>) -> Result<CompositionAnalysis, &'static str> {
    let gray = stats::grayscale(pixels);
    let (h, w) = gray.dim();

    let third_h = h / 3;
    let third_w = w / 3;
    if third_h == 0 || third_w == 0 {
        return Err("image smaller than the 3x3 grid");
    }

    let mut cells = Vec::with_capacity(9);
    for row in 0..3 {
        for col in 0..3 {
            let view = gray.slice(ndarray::s![
                row * third_h..(row + 1) * third_h,
                col * third_w..(col + 1) * third_w
            ]);
            cells.push(stats::variance(&view.to_owned()));
        }
    }

    let center = cells[4];
    let thirds = THIRDS_CELLS.iter().map(|&i| cells[i]).sum::<f64>() / 4.0;
    let max_interest = cells.iter().cloned().fold(f64::MIN, f64::max);

    let composition_score = (thirds / (center + CENTER_EPSILON)).min(SCORE_CAP);
    let adherence = if max_interest > 0.0 {
        thirds / max_interest
    } else {
        // Perfectly flat image: no cell is more interesting than another
        0.5
    };

    Ok(CompositionAnalysis {
        composition_score,
        center_interest: center,
        rule_of_thirds_adherence: adherence,
        cell_variances: cells,
    })
}
