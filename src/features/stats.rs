//! Color-space transforms and statistical image metrics.
//!
//! All functions take the preprocessed `(H, W, 3)` unit-interval array.
//! Intensity-based metrics are computed on the 0–255 scale the scoring
//! thresholds were calibrated against.

use ndarray::{Array2, ArrayView3};

/// ITU-R BT.601 luminance weights.
const LUMA_R: f64 = 0.299;
const LUMA_G: f64 = 0.587;
const LUMA_B: f64 = 0.114;

/// Grayscale intensity on the 0–255 scale, BT.601 weighting.
pub fn grayscale(pixels: &ArrayView3<'_, f32>) -> Array2<f64> {
    let (h, w, _) = pixels.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        let r = f64::from(pixels[[y, x, 0]]);
        let g = f64::from(pixels[[y, x, 1]]);
        let b = f64::from(pixels[[y, x, 2]]);
        (LUMA_R * r + LUMA_G * g + LUMA_B * b) * 255.0
    })
}

/// Plain channel-average grayscale on the unit scale.
/// The heuristic predictor was tuned against this simpler mix.
pub fn channel_mean_gray(pixels: &ArrayView3<'_, f32>) -> Array2<f64> {
    let (h, w, _) = pixels.dim();
    Array2::from_shape_fn((h, w), |(y, x)| {
        (f64::from(pixels[[y, x, 0]]) + f64::from(pixels[[y, x, 1]]) + f64::from(pixels[[y, x, 2]]))
            / 3.0
    })
}

/// Population mean.
pub fn mean(values: &Array2<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.sum() / values.len() as f64
}

/// Population standard deviation.
pub fn std_dev(values: &Array2<f64>) -> f64 {
    variance(values).sqrt()
}

/// Population variance.
pub fn variance(values: &Array2<f64>) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let n = values.len() as f64;
    let mean = values.sum() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_sq / n).max(0.0)
}

/// HSV components of one RGB pixel (unit-interval inputs).
/// Hue in degrees [0, 360); saturation and value in [0,1].
pub fn rgb_to_hsv(r: f64, g: f64, b: f64) -> (f64, f64, f64) {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta.abs() < f64::EPSILON {
        0.0
    } else if (max - r).abs() < f64::EPSILON {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if (max - g).abs() < f64::EPSILON {
        60.0 * ((b - r) / delta + 2.0)
    } else {
        60.0 * ((r - g) / delta + 4.0)
    };

    let saturation = if max.abs() < f64::EPSILON { 0.0 } else { delta / max };

    (hue, saturation, max)
}

/// Mean saturation over the whole image, in [0,1].
pub fn mean_saturation(pixels: &ArrayView3<'_, f32>) -> f64 {
    let (h, w, _) = pixels.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }
    let mut sum = 0.0;
    for y in 0..h {
        for x in 0..w {
            let (_, s, _) = rgb_to_hsv(
                f64::from(pixels[[y, x, 0]]),
                f64::from(pixels[[y, x, 1]]),
                f64::from(pixels[[y, x, 2]]),
            );
            sum += s;
        }
    }
    sum / (h * w) as f64
}

/// Per-image HSV channel means on the 8-bit OpenCV scale
/// (hue halved to 0–180, saturation/value 0–255).
pub fn hsv_channel_means(pixels: &ArrayView3<'_, f32>) -> (f64, f64, f64) {
    let (h, w, _) = pixels.dim();
    if h == 0 || w == 0 {
        return (0.0, 0.0, 0.0);
    }
    let (mut sum_h, mut sum_s, mut sum_v) = (0.0, 0.0, 0.0);
    for y in 0..h {
        for x in 0..w {
            let (hue, s, v) = rgb_to_hsv(
                f64::from(pixels[[y, x, 0]]),
                f64::from(pixels[[y, x, 1]]),
                f64::from(pixels[[y, x, 2]]),
            );
            sum_h += hue / 2.0;
            sum_s += s * 255.0;
            sum_v += v * 255.0;
        }
    }
    let n = (h * w) as f64;
    (sum_h / n, sum_s / n, sum_v / n)
}

/// CIE L* lightness of one sRGB pixel (unit-interval inputs), range 0–100.
pub fn lab_lightness(r: f64, g: f64, b: f64) -> f64 {
    fn linearize(c: f64) -> f64 {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    }
    // Y component of sRGB → XYZ (D65)
    let y = 0.2126 * linearize(r) + 0.7152 * linearize(g) + 0.0722 * linearize(b);
    let fy = if y > 0.008856 {
        y.cbrt()
    } else {
        7.787 * y + 16.0 / 116.0
    };
    (116.0 * fy - 16.0).clamp(0.0, 100.0)
}

/// Mean L* lightness over the image, range 0–100.
pub fn mean_lightness(pixels: &ArrayView3<'_, f32>) -> f64 {
    let (h, w, _) = pixels.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }
    let mut sum = 0.0;
    for y in 0..h {
        for x in 0..w {
            sum += lab_lightness(
                f64::from(pixels[[y, x, 0]]),
                f64::from(pixels[[y, x, 1]]),
                f64::from(pixels[[y, x, 2]]),
            );
        }
    }
    sum / (h * w) as f64
}

/// Variance of the 3×3 Laplacian response — the sharpness proxy.
///
/// Kernel `[0,1,0; 1,-4,1; 0,1,0]`, borders skipped. Input on the 0–255
/// scale so thresholds match the calibrated ranges.
pub fn laplacian_variance(gray: &Array2<f64>) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    let count = ((h - 2) * (w - 2)) as f64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let lap = gray[[y - 1, x]] + gray[[y + 1, x]] + gray[[y, x - 1]] + gray[[y, x + 1]]
                - 4.0 * gray[[y, x]];
            sum += lap;
            sum_sq += lap * lap;
        }
    }

    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0)
}

/// Mean Sobel gradient magnitude on whatever scale `gray` uses.
/// Borders skipped; used by the heuristic predictor's sharpness term.
pub fn mean_gradient_magnitude(gray: &Array2<f64>) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let count = ((h - 2) * (w - 2)) as f64;

    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = (gray[[y, x + 1]] - gray[[y, x - 1]]) / 2.0;
            let gy = (gray[[y + 1, x]] - gray[[y - 1, x]]) / 2.0;
            sum += (gx * gx + gy * gy).sqrt();
        }
    }

    sum / count
}

/// Fraction of pixels flagged as edges by a Canny-style detector.
///
/// Sobel gradient magnitude with double thresholding (weak 50, strong 150
/// on the 0–255 scale) and one hysteresis pass: weak responses survive
/// only next to a strong one.
pub fn edge_density(gray: &Array2<f64>, weak: f64, strong: f64) -> f64 {
    let (h, w) = gray.dim();
    if h < 3 || w < 3 {
        return 0.0;
    }

    let mut magnitude = Array2::<f64>::zeros((h, w));
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let gx = gray[[y - 1, x + 1]] + 2.0 * gray[[y, x + 1]] + gray[[y + 1, x + 1]]
                - gray[[y - 1, x - 1]]
                - 2.0 * gray[[y, x - 1]]
                - gray[[y + 1, x - 1]];
            let gy = gray[[y + 1, x - 1]] + 2.0 * gray[[y + 1, x]] + gray[[y + 1, x + 1]]
                - gray[[y - 1, x - 1]]
                - 2.0 * gray[[y - 1, x]]
                - gray[[y - 1, x + 1]];
            magnitude[[y, x]] = (gx * gx + gy * gy).sqrt();
        }
    }

    let mut edge_count = 0usize;
    for y in 1..h - 1 {
        for x in 1..w - 1 {
            let m = magnitude[[y, x]];
            if m >= strong {
                edge_count += 1;
            } else if m >= weak {
                // Hysteresis: keep weak edges touching a strong neighbor
                let mut connected = false;
                'outer: for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dy == 0 && dx == 0 {
                            continue;
                        }
                        let ny = (y as i64 + dy) as usize;
                        let nx = (x as i64 + dx) as usize;
                        if magnitude[[ny, nx]] >= strong {
                            connected = true;
                            break 'outer;
                        }
                    }
                }
                if connected {
                    edge_count += 1;
                }
            }
        }
    }

    edge_count as f64 / (h * w) as f64
}

/// Variance of a 256-bin intensity histogram for one channel.
pub fn channel_histogram_variance(pixels: &ArrayView3<'_, f32>, channel: usize) -> f64 {
    let (h, w, _) = pixels.dim();
    if h == 0 || w == 0 {
        return 0.0;
    }

    let mut bins = [0.0f64; 256];
    for y in 0..h {
        for x in 0..w {
            let v = (f64::from(pixels[[y, x, channel]]) * 255.0).round().clamp(0.0, 255.0);
            bins[v as usize] += 1.0;
        }
    }

    let n = 256.0;
    let mean = bins.iter().sum::<f64>() / n;
    bins.iter().map(|c| (c - mean) * (c - mean)).sum::<f64>() / n
}

/// Helper for building a uniform test image.
#[cfg(test)]
pub(crate) fn uniform_pixels(h: usize, w: usize, value: f32) -> ndarray::Array3<f32> {
    ndarray::Array3::from_elem((h, w, 3), value)
}
