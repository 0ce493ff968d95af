//! Image preprocessing: decode → RGB → letterbox → unit-interval array.
//!
//! Every analysis starts here. The output is a fixed-size square float
//! array so the feature extractor and the score predictor always see the
//! same shape regardless of the uploaded image.
//!
//! Decode and resize failures propagate to the caller — this is the one
//! stage where a failure aborts the whole analysis.

use image::imageops::FilterType;
use image::{Rgb, RgbImage};
use ndarray::Array3;
use tracing::debug;

/// Default square edge for the analysis canvas.
pub const DEFAULT_TARGET_SIZE: u32 = 224;

/// Errors from the preprocessing stage.
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("image decoding failed: {0}")]
    Decode(String),
}

/// Letterboxing options.
#[derive(Debug, Clone)]
pub struct PreprocessOptions {
    /// Target square dimension.
    pub target_size: u32,
    /// Fill color for the padding bars (RGB). Black for thumbnails.
    pub padding_color: [u8; 3],
}

impl Default for PreprocessOptions {
    fn default() -> Self {
        Self {
            target_size: DEFAULT_TARGET_SIZE,
            padding_color: [0, 0, 0],
        }
    }
}

/// Decode raw upload bytes and normalize them for analysis.
///
/// Steps: decode → convert to RGB → letterbox to `target_size` ×
/// `target_size` preserving aspect ratio → scale samples to [0,1] as an
/// `(H, W, 3)` float array. The decoder is the sole judge of validity;
/// a well-formed 1×1 image is a legitimate input.
pub fn preprocess(bytes: &[u8], opts: &PreprocessOptions) -> Result<Array3<f32>, PreprocessError> {
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| PreprocessError::Decode(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (orig_w, orig_h) = (rgb.width(), rgb.height());

    let canvas = letterbox(&rgb, opts);

    debug!(
        original = format!("{orig_w}x{orig_h}"),
        target = opts.target_size,
        "Image preprocessed"
    );

    Ok(to_unit_array(&canvas))
}

/// Resize preserving aspect ratio, then center on a filled square canvas.
///
/// The scale factor is `min(target/w, target/h)` with no upscaling guard:
/// thumbnails smaller than the canvas are scaled up, matching the behavior
/// scoring was calibrated against. Scaled dimensions truncate toward zero.
pub fn letterbox(rgb: &RgbImage, opts: &PreprocessOptions) -> RgbImage {
    let target = opts.target_size;
    let (content_w, content_h) = fit_dimensions(rgb.width(), rgb.height(), target);

    let resized = image::imageops::resize(rgb, content_w, content_h, FilterType::Lanczos3);

    let [r, g, b] = opts.padding_color;
    let mut canvas = RgbImage::from_pixel(target, target, Rgb([r, g, b]));

    let offset_x = (target - content_w) / 2;
    let offset_y = (target - content_h) / 2;
    image::imageops::overlay(&mut canvas, &resized, i64::from(offset_x), i64::from(offset_y));

    canvas
}

/// Content dimensions inside the letterboxed canvas.
///
/// Uniform scale, truncating multiplication, clamped to at least 1 px so
/// degenerate inputs still produce a drawable region.
pub fn fit_dimensions(width: u32, height: u32, target: u32) -> (u32, u32) {
    if width == 0 || height == 0 {
        return (1, 1);
    }

    let scale = (target as f64 / width as f64).min(target as f64 / height as f64);
    let new_w = ((width as f64 * scale) as u32).clamp(1, target);
    let new_h = ((height as f64 * scale) as u32).clamp(1, target);
    (new_w, new_h)
}

/// Convert an 8-bit RGB image to an `(H, W, 3)` float array in [0,1].
fn to_unit_array(img: &RgbImage) -> Array3<f32> {
    let (w, h) = (img.width() as usize, img.height() as usize);
    let mut out = Array3::<f32>::zeros((h, w, 3));
    for (x, y, pixel) in img.enumerate_pixels() {
        let (x, y) = (x as usize, y as usize);
        out[[y, x, 0]] = f32::from(pixel.0[0]) / 255.0;
        out[[y, x, 1]] = f32::from(pixel.0[1]) / 255.0;
        out[[y, x, 2]] = f32::from(pixel.0[2]) / 255.0;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat};

    pub(crate) fn encode_png(img: &RgbImage) -> Vec<u8> {
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img.clone())
            .write_to(&mut cursor, ImageFormat::Png)
            .unwrap();
        cursor.into_inner()
    }

    fn solid_png(w: u32, h: u32, color: [u8; 3]) -> Vec<u8> {
        encode_png(&RgbImage::from_pixel(w, h, Rgb(color)))
    }

    #[test]
    fn output_shape_and_range() {
        let bytes = solid_png(640, 360, [200, 40, 40]);
        let arr = preprocess(&bytes, &PreprocessOptions::default()).unwrap();
        assert_eq!(arr.dim(), (224, 224, 3));
        assert!(arr.iter().all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn landscape_is_padded_top_and_bottom() {
        let bytes = solid_png(640, 360, [200, 200, 200]);
        let arr = preprocess(&bytes, &PreprocessOptions::default()).unwrap();

        // 640x360 → content 224x126, vertical bars of (224-126)/2 = 49 px
        assert!(arr[[0, 112, 0]] < 0.01, "top bar should be black");
        assert!(arr[[223, 112, 0]] < 0.01, "bottom bar should be black");
        assert!(arr[[112, 112, 0]] > 0.7, "center should be content");
    }

    #[test]
    fn small_images_are_upscaled() {
        // 100x50 fits with scale 2.24 → content 224x112
        let (w, h) = fit_dimensions(100, 50, 224);
        assert_eq!(w, 224);
        assert_eq!(h, 112);
    }

    #[test]
    fn aspect_ratio_preserved_within_rounding() {
        let (w, h) = fit_dimensions(1920, 1080, 224);
        let source = 1920.0 / 1080.0;
        let fitted = w as f64 / h as f64;
        assert!((source - fitted).abs() < 0.05, "got {fitted}, want ~{source}");
    }

    #[test]
    fn padding_is_centered_within_one_pixel() {
        for (w, h) in [(640u32, 360u32), (333, 777), (1280, 719)] {
            let (cw, ch) = fit_dimensions(w, h, 224);
            let left = (224 - cw) / 2;
            let right = 224 - cw - left;
            let top = (224 - ch) / 2;
            let bottom = 224 - ch - top;
            assert!(left.abs_diff(right) <= 1, "{w}x{h}: horizontal padding uneven");
            assert!(top.abs_diff(bottom) <= 1, "{w}x{h}: vertical padding uneven");
        }
    }

    #[test]
    fn square_input_fills_canvas() {
        let (w, h) = fit_dimensions(500, 500, 224);
        assert_eq!((w, h), (224, 224));
    }

    #[test]
    fn degenerate_dimensions_clamped() {
        let (w, h) = fit_dimensions(0, 0, 224);
        assert!(w >= 1 && h >= 1);
    }

    #[test]
    fn garbage_bytes_fail_with_decode_error() {
        let garbage = [0xDE, 0xAD, 0xBE, 0xEF].repeat(64);
        let err = preprocess(&garbage, &PreprocessOptions::default()).unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));
    }

    #[test]
    fn truncated_payload_fails_with_decode_error() {
        let err = preprocess(&[0x89, 0x50], &PreprocessOptions::default()).unwrap_err();
        assert!(matches!(err, PreprocessError::Decode(_)));
    }

    #[test]
    fn one_pixel_webp_decodes_despite_tiny_encoding() {
        // A 1x1 lossless WebP encodes to a few dozen bytes; size alone
        // must not disqualify it
        let img = RgbImage::from_pixel(1, 1, Rgb([90, 120, 40]));
        let mut cursor = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut cursor, ImageFormat::WebP)
            .unwrap();

        let arr = preprocess(&cursor.into_inner(), &PreprocessOptions::default()).unwrap();
        assert_eq!(arr.dim(), (224, 224, 3));
    }

    #[test]
    fn custom_target_size_respected() {
        let bytes = solid_png(300, 300, [10, 20, 30]);
        let opts = PreprocessOptions {
            target_size: 96,
            ..PreprocessOptions::default()
        };
        let arr = preprocess(&bytes, &opts).unwrap();
        assert_eq!(arr.dim(), (96, 96, 3));
    }
}
