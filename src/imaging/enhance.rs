//! OCR enhancement heuristics
//!
//! Deskew from a line-angle histogram, then a fixed chain of contrast
//! equalization, sharpening, denoising, Otsu binarization and speckle
//! removal. Enhancement is a best-effort optimization: any stage failure
//! returns the original image unmodified.

use image::{GrayImage, Luma};
use imageproc::contrast::{equalize_histogram, otsu_level, threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{filter3x3, median_filter};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use imageproc::hough::{detect_lines, LineDetectionOptions};
use imageproc::morphology::open;
use tracing::{debug, warn};

use crate::config::EnhanceSettings;

/// Fixed sharpening kernel.
const SHARPEN_KERNEL: [f32; 9] = [0.0, -1.0, 0.0, -1.0, 5.0, -1.0, 0.0, -1.0, 0.0];

/// Enhance a grayscale image for OCR. Falls back to the unmodified input
/// when disabled or when any stage fails.
pub fn enhance_for_ocr(image: &GrayImage, settings: &EnhanceSettings) -> GrayImage {
    if !settings.enabled {
        debug!("Enhancement disabled");
        return image.clone();
    }

    match try_enhance(image, settings) {
        Some(enhanced) => enhanced,
        None => {
            warn!("Enhancement failed, returning original image");
            image.clone()
        }
    }
}

fn try_enhance(image: &GrayImage, settings: &EnhanceSettings) -> Option<GrayImage> {
    let (width, height) = image.dimensions();
    if width < 3 || height < 3 {
        return None;
    }

    let mut processed = image.clone();

    // Deskew from the dominant text/table line angle. The estimate is the
    // skew itself, so the rotation applies its negation.
    if settings.deskew {
        if let Some(angle) = estimate_skew_degrees(&processed, settings) {
            debug!(angle, "Rotating image to correct skew");
            processed = rotate_about_center(
                &processed,
                (-angle).to_radians(),
                Interpolation::Bilinear,
                Luma([255u8]),
            );
        }
    }

    // Global histogram equalization. A locally adaptive pass would handle
    // unevenly lit photos better, but none is available upstream.
    let equalized = equalize_histogram(&processed);
    let sharpened: GrayImage = filter3x3(&equalized, &SHARPEN_KERNEL);

    let denoised = if settings.denoise {
        median_filter(&sharpened, 1, 1)
    } else {
        sharpened
    };

    // Variance-maximizing global threshold, then a small opening pass to
    // remove speckle noise.
    let level = otsu_level(&denoised);
    let binary = threshold(&denoised, level, ThresholdType::Binary);
    let cleaned = open(&binary, Norm::LInf, 1);

    Some(cleaned)
}

/// Estimate the skew angle in degrees from the top detected lines.
///
/// Angles further than 45 degrees from the vertical reference are ignored;
/// an average below the configured magnitude is treated as noise and
/// returns None.
fn estimate_skew_degrees(image: &GrayImage, settings: &EnhanceSettings) -> Option<f32> {
    let edges = canny(image, 50.0, 150.0);
    let lines = detect_lines(
        &edges,
        LineDetectionOptions {
            vote_threshold: settings.line_vote_threshold,
            suppression_radius: 8,
        },
    );

    let mut angle_sum = 0.0f32;
    let mut angle_count = 0usize;
    for line in lines.iter().take(settings.max_deskew_lines) {
        let angle = line.angle_in_degrees as f32 - 90.0;
        if angle.abs() < 45.0 {
            angle_sum += angle;
            angle_count += 1;
        }
    }

    if angle_count == 0 {
        return None;
    }

    let average = angle_sum / angle_count as f32;
    if average.abs() > settings.min_rotation_degrees {
        Some(average)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_like_image() -> GrayImage {
        // Horizontal dark bars on white, similar to printed lines.
        let mut img = GrayImage::from_pixel(200, 200, Luma([255u8]));
        for bar in 0..5 {
            let y0 = 30 + bar * 30;
            for y in y0..y0 + 4 {
                for x in 20..180 {
                    img.put_pixel(x, y, Luma([10u8]));
                }
            }
        }
        img
    }

    #[test]
    fn test_disabled_returns_original() {
        let img = text_like_image();
        let settings = EnhanceSettings {
            enabled: false,
            ..EnhanceSettings::default()
        };
        assert_eq!(enhance_for_ocr(&img, &settings), img);
    }

    #[test]
    fn test_output_is_binary() {
        let img = text_like_image();
        let enhanced = enhance_for_ocr(&img, &EnhanceSettings::default());
        assert_eq!(enhanced.dimensions(), img.dimensions());
        for pixel in enhanced.pixels() {
            let v = pixel.0[0];
            assert!(v == 0 || v == 255, "non-binary pixel value {}", v);
        }
    }

    #[test]
    fn test_tiny_image_falls_back() {
        let img = GrayImage::from_pixel(2, 2, Luma([128u8]));
        let enhanced = enhance_for_ocr(&img, &EnhanceSettings::default());
        assert_eq!(enhanced, img);
    }

    #[test]
    fn test_skew_correction_reduces_estimated_angle() {
        let img = text_like_image();
        let settings = EnhanceSettings::default();

        let skewed = rotate_about_center(
            &img,
            5.0_f32.to_radians(),
            Interpolation::Bilinear,
            Luma([255u8]),
        );
        let before = match estimate_skew_degrees(&skewed, &settings) {
            Some(angle) => angle,
            None => return, // Hough found too few lines; nothing to verify.
        };
        assert!(before.abs() > 1.0, "skew not detected: {}", before);

        // Apply the same correction the enhancement pass applies.
        let corrected = rotate_about_center(
            &skewed,
            (-before).to_radians(),
            Interpolation::Bilinear,
            Luma([255u8]),
        );
        let after = estimate_skew_degrees(&corrected, &settings).map_or(0.0, f32::abs);
        assert!(
            after < before.abs(),
            "correction increased skew: before={} after={}",
            before,
            after
        );
    }

    #[test]
    fn test_straight_lines_produce_no_rotation() {
        let img = text_like_image();
        let settings = EnhanceSettings::default();
        // Perfectly horizontal bars: any detected lines average to ~0
        // degrees, which is below the 1 degree noise floor.
        let angle = estimate_skew_degrees(&img, &settings);
        if let Some(a) = angle {
            panic!("unexpected rotation of {} degrees for straight input", a);
        }
    }
}
