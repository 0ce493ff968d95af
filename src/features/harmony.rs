//! Color-harmony scoring via k-means palette clustering.
//!
//! The image is reduced to five dominant colors; harmony is how evenly
//! pixels distribute across them. A palette where every dominant color
//! carries similar weight reads as balanced; one color swallowing the
//! frame reads as monotonous.

use ndarray::ArrayView3;
use rand::Rng;

/// Number of dominant color clusters.
const K: usize = 5;

/// Maximum Lloyd iterations per attempt.
const MAX_ITERATIONS: usize = 20;

/// Random restarts; the attempt with the lowest inertia wins.
const ATTEMPTS: usize = 10;

/// Convergence threshold on total center movement.
const CONVERGENCE_EPS: f64 = 1e-4;

/// Compute the color-harmony score in [0, 100].
///
/// `100 × (1 − std of cluster population fractions)`: an even split across
/// the five clusters scores near 100, a single dominant cluster ~60.
/// Returns `None` when the image has no pixels.
pub fn color_harmony<R: Rng>(pixels: &ArrayView3<'_, f32>, rng: &mut R) -> Option<f64> {
    let (h, w, _) = pixels.dim();
    let n = h * w;
    if n == 0 {
        return None;
    }

    let mut points = Vec::with_capacity(n);
    for y in 0..h {
        for x in 0..w {
            points.push([
                f64::from(pixels[[y, x, 0]]),
                f64::from(pixels[[y, x, 1]]),
                f64::from(pixels[[y, x, 2]]),
            ]);
        }
    }

    let assignments = best_kmeans(&points, rng);

    // Population fraction of each non-empty cluster
    let mut counts = [0usize; K];
    for &label in &assignments {
        counts[label] += 1;
    }
    let fractions: Vec<f64> = counts
        .iter()
        .filter(|&&c| c > 0)
        .map(|&c| c as f64 / n as f64)
        .collect();

    let mean = fractions.iter().sum::<f64>() / fractions.len() as f64;
    let variance = fractions
        .iter()
        .map(|f| (f - mean) * (f - mean))
        .sum::<f64>()
        / fractions.len() as f64;
    let std = variance.sqrt();

    Some(((1.0 - std) * 100.0).clamp(0.0, 100.0))
}

/// Run k-means `ATTEMPTS` times and keep the assignment with the lowest
/// inertia (sum of squared distances to assigned centers).
fn best_kmeans<R: Rng>(points: &[[f64; 3]], rng: &mut R) -> Vec<usize> {
    let mut best: Option<(f64, Vec<usize>)> = None;

    for _ in 0..ATTEMPTS {
        let (inertia, assignments) = kmeans_once(points, rng);
        if best.as_ref().map_or(true, |(b, _)| inertia < *b) {
            best = Some((inertia, assignments));
        }
    }

    best.map(|(_, a)| a).unwrap_or_default()
}

/// One bounded-iteration Lloyd run from random initial centers.
fn kmeans_once<R: Rng>(points: &[[f64; 3]], rng: &mut R) -> (f64, Vec<usize>) {
    // Random center initialization from the point set
    let mut centers: Vec<[f64; 3]> = (0..K)
        .map(|_| points[rng.gen_range(0..points.len())])
        .collect();
    let mut assignments = vec![0usize; points.len()];

    for _ in 0..MAX_ITERATIONS {
        // Assignment step
        for (i, p) in points.iter().enumerate() {
            assignments[i] = nearest_center(p, &centers);
        }

        // Update step
        let mut sums = [[0.0f64; 3]; K];
        let mut counts = [0usize; K];
        for (p, &label) in points.iter().zip(&assignments) {
            for c in 0..3 {
                sums[label][c] += p[c];
            }
            counts[label] += 1;
        }

        let mut movement = 0.0;
        for k in 0..K {
            if counts[k] == 0 {
                // Re-seed empty clusters from a random point
                centers[k] = points[rng.gen_range(0..points.len())];
                continue;
            }
            let new = [
                sums[k][0] / counts[k] as f64,
                sums[k][1] / counts[k] as f64,
                sums[k][2] / counts[k] as f64,
            ];
            movement += squared_distance(&centers[k], &new);
            centers[k] = new;
        }

        if movement < CONVERGENCE_EPS {
            break;
        }
    }

    let inertia = points
        .iter()
        .zip(&assignments)
        .map(|(p, &label)| squared_distance(p, &centers[label]))
        .sum();

    (inertia, assignments)
}

fn nearest_center(point: &[f64; 3], centers: &[[f64; 3]]) -> usize {
    let mut best = 0;
    let mut best_dist = f64::INFINITY;
    for (i, c) in centers.iter().enumerate() {
        let d = squared_distance(point, c);
        if d < best_dist {
            best_dist = d;
            best = i;
        }
    }
    best
}

fn squared_distance(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Image with `n` equally sized vertical color stripes.
    fn striped(colors: &[[f32; 3]]) -> Array3<f32> {
        let w = colors.len() * 8;
        let mut pixels = Array3::<f32>::zeros((16, w, 3));
        for y in 0..16 {
            for x in 0..w {
                let color = colors[x / 8];
                for c in 0..3 {
                    pixels[[y, x, c]] = color[c];
                }
            }
        }
        pixels
    }

    #[test]
    fn five_even_colors_score_near_perfect() {
        let pixels = striped(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let score = color_harmony(&pixels.view(), &mut rng).unwrap();
        assert!(score > 95.0, "even palette should score high, got {score}");
    }

    #[test]
    fn skewed_palette_scores_lower_than_balanced() {
        // Fractions are computed over observed clusters only, so a
        // single-color frame degenerates to one cluster and scores a
        // perfect 100. The discriminating case is an uneven split:
        // 90% red / 10% blue gives fraction std 0.4 → score ~60.
        let mut skewed = Array3::<f32>::zeros((16, 40, 3));
        for y in 0..16 {
            for x in 0..40 {
                if x < 36 {
                    skewed[[y, x, 0]] = 1.0;
                } else {
                    skewed[[y, x, 2]] = 1.0;
                }
            }
        }
        let mut rng = StdRng::seed_from_u64(7);
        let lopsided = color_harmony(&skewed.view(), &mut rng).unwrap();

        let balanced = striped(&[
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
            [1.0, 1.0, 0.0],
            [0.0, 1.0, 1.0],
        ]);
        let mut rng = StdRng::seed_from_u64(7);
        let spread = color_harmony(&balanced.view(), &mut rng).unwrap();

        assert!(
            spread > lopsided,
            "balanced {spread} should beat lopsided {lopsided}"
        );
        assert!(lopsided < 80.0, "90/10 split should score low, got {lopsided}");
    }

    #[test]
    fn score_is_invariant_under_pixel_permutation() {
        let pixels = striped(&[
            [0.9, 0.1, 0.1],
            [0.1, 0.9, 0.1],
            [0.1, 0.1, 0.9],
            [0.9, 0.9, 0.1],
            [0.2, 0.5, 0.8],
        ]);

        // Reverse both axes: identical palette, different pixel order
        let mut shuffled = pixels.clone();
        shuffled.invert_axis(ndarray::Axis(0));
        shuffled.invert_axis(ndarray::Axis(1));

        let mut rng_a = StdRng::seed_from_u64(99);
        let mut rng_b = StdRng::seed_from_u64(99);
        let a = color_harmony(&pixels.view(), &mut rng_a).unwrap();
        let b = color_harmony(&shuffled.view(), &mut rng_b).unwrap();

        assert!((a - b).abs() < 1.0, "permutation changed harmony: {a} vs {b}");
    }

    #[test]
    fn empty_image_yields_none() {
        let pixels = Array3::<f32>::zeros((0, 0, 3));
        let mut rng = StdRng::seed_from_u64(1);
        assert!(color_harmony(&pixels.view(), &mut rng).is_none());
    }

    #[test]
    fn score_bounded_to_hundred() {
        let pixels = striped(&[[0.5, 0.5, 0.5], [0.6, 0.6, 0.6]]);
        let mut rng = StdRng::seed_from_u64(3);
        let score = color_harmony(&pixels.view(), &mut rng).unwrap();
        assert!((0.0..=100.0).contains(&score));
    }
}
