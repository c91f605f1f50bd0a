//! QR-code masking
//!
//! Printed plans carry a QR code whose dense modules pollute recognized
//! text. Square high-contrast contours are painted solid white before OCR.
//! This pass never fails; on any internal problem the unmodified image and
//! an empty region list are returned.

use image::{GrayImage, Luma};
use imageproc::contours::find_contours;
use imageproc::contrast::adaptive_threshold;
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::geometry::{approximate_polygon_dp, arc_length};
use imageproc::point::Point;
use imageproc::rect::Rect;
use tracing::{debug, warn};

/// Axis-aligned region that was painted over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Padding added around each detected QR region before painting.
const MASK_PADDING: u32 = 20;
/// Minimum candidate area in pixels.
const MIN_REGION_AREA: f64 = 1000.0;
/// Pixel intensity standard deviation above which a square region is
/// considered a printed QR pattern.
const MIN_REGION_STDDEV: f64 = 50.0;

/// Detect likely QR codes and paint them white.
pub fn mask_qr_codes(image: &GrayImage) -> (GrayImage, Vec<MaskedRegion>) {
    match try_mask(image) {
        Some(result) => result,
        None => {
            warn!("QR masking failed, returning unmodified image");
            (image.clone(), Vec::new())
        }
    }
}

fn try_mask(image: &GrayImage) -> Option<(GrayImage, Vec<MaskedRegion>)> {
    let (width, height) = image.dimensions();
    if width < 64 || height < 64 {
        return Some((image.clone(), Vec::new()));
    }

    let binary = adaptive_threshold(image, 25);
    let contours = find_contours::<i32>(&binary);

    let max_area = width as f64 * height as f64 * 0.5;
    let mut regions = Vec::new();

    for contour in &contours {
        if contour.points.len() < 4 {
            continue;
        }
        let perimeter = arc_length(&contour.points, true);
        let approx = approximate_polygon_dp(&contour.points, 0.04 * perimeter, true);
        if approx.len() != 4 {
            continue;
        }

        let area = contour_area(&contour.points);
        if area <= MIN_REGION_AREA || area >= max_area {
            continue;
        }

        let (x, y, w, h) = bounding_rect(&contour.points);
        if w == 0 || h == 0 {
            continue;
        }
        if !is_square_aspect(w, h) {
            continue;
        }

        // QR modules alternate between black and white at print density,
        // which shows up as high local contrast.
        if region_stddev(image, x, y, w, h) > MIN_REGION_STDDEV {
            regions.push(MaskedRegion {
                x,
                y,
                width: w,
                height: h,
            });
        }
    }

    let mut output = image.clone();
    for region in &regions {
        let x = region.x.saturating_sub(MASK_PADDING);
        let y = region.y.saturating_sub(MASK_PADDING);
        let w = (region.width + 2 * MASK_PADDING).min(width - x);
        let h = (region.height + 2 * MASK_PADDING).min(height - y);
        draw_filled_rect_mut(
            &mut output,
            Rect::at(x as i32, y as i32).of_size(w, h),
            Luma([255u8]),
        );
    }

    debug!(masked = regions.len(), "QR regions masked");
    Some((output, regions))
}

/// QR codes are square; both bounds are exclusive.
fn is_square_aspect(w: u32, h: u32) -> bool {
    let aspect = w as f64 / h as f64;
    aspect > 0.8 && aspect < 1.2
}

fn bounding_rect(points: &[Point<i32>]) -> (u32, u32, u32, u32) {
    let min_x = points.iter().map(|p| p.x).min().unwrap_or(0).max(0);
    let min_y = points.iter().map(|p| p.y).min().unwrap_or(0).max(0);
    let max_x = points.iter().map(|p| p.x).max().unwrap_or(0).max(0);
    let max_y = points.iter().map(|p| p.y).max().unwrap_or(0).max(0);
    (
        min_x as u32,
        min_y as u32,
        (max_x - min_x) as u32,
        (max_y - min_y) as u32,
    )
}

fn contour_area(points: &[Point<i32>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    let mut sum = 0.0f64;
    for i in 0..points.len() {
        let a = &points[i];
        let b = &points[(i + 1) % points.len()];
        sum += a.x as f64 * b.y as f64 - b.x as f64 * a.y as f64;
    }
    sum.abs() / 2.0
}

fn region_stddev(image: &GrayImage, x: u32, y: u32, w: u32, h: u32) -> f64 {
    let (width, height) = image.dimensions();
    let x2 = (x + w).min(width);
    let y2 = (y + h).min(height);
    let count = ((x2 - x) as u64 * (y2 - y) as u64) as f64;
    if count == 0.0 {
        return 0.0;
    }

    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for yy in y..y2 {
        for xx in x..x2 {
            let v = image.get_pixel(xx, yy).0[0] as f64;
            sum += v;
            sum_sq += v * v;
        }
    }
    let mean = sum / count;
    (sum_sq / count - mean * mean).max(0.0).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Checkerboard square on white background, QR-like.
    fn image_with_qr(size: u32, qr_origin: (u32, u32), qr_size: u32) -> GrayImage {
        let mut img = GrayImage::from_pixel(size, size, Luma([255u8]));
        let (ox, oy) = qr_origin;
        for y in 0..qr_size {
            for x in 0..qr_size {
                let v = if (x / 4 + y / 4) % 2 == 0 { 0u8 } else { 255u8 };
                img.put_pixel(ox + x, oy + y, Luma([v]));
            }
        }
        img
    }

    #[test]
    fn test_plain_image_unchanged() {
        let img = GrayImage::from_pixel(300, 300, Luma([255u8]));
        let (masked, regions) = mask_qr_codes(&img);
        assert!(regions.is_empty());
        assert_eq!(masked, img);
    }

    #[test]
    fn test_tiny_image_short_circuits() {
        let img = GrayImage::from_pixel(32, 32, Luma([128u8]));
        let (masked, regions) = mask_qr_codes(&img);
        assert!(regions.is_empty());
        assert_eq!(masked, img);
    }

    #[test]
    fn test_qr_region_painted_white() {
        let img = image_with_qr(400, (100, 100), 80);
        let (masked, regions) = mask_qr_codes(&img);

        if regions.is_empty() {
            // Contour tracing may split the checkerboard into modules too
            // small to pass the area gate; the pass must still be lossless.
            assert_eq!(masked, img);
        } else {
            for region in &regions {
                assert!(region.width >= 40 && region.height >= 40);
                // Center of the masked area is now white.
                let cx = region.x + region.width / 2;
                let cy = region.y + region.height / 2;
                assert_eq!(masked.get_pixel(cx, cy).0[0], 255);
            }
        }
    }

    #[test]
    fn test_region_stddev_flat_vs_checker() {
        let flat = GrayImage::from_pixel(100, 100, Luma([200u8]));
        assert!(region_stddev(&flat, 10, 10, 50, 50) < 1.0);

        let checker = image_with_qr(100, (0, 0), 100);
        assert!(region_stddev(&checker, 0, 0, 100, 100) > MIN_REGION_STDDEV);
    }

    #[test]
    fn test_square_aspect_bounds_exclusive() {
        assert!(is_square_aspect(100, 100));
        assert!(is_square_aspect(90, 100));
        assert!(is_square_aspect(110, 100));
        // Exactly at the bounds is rejected.
        assert!(!is_square_aspect(80, 100));
        assert!(!is_square_aspect(120, 100));
        assert!(!is_square_aspect(200, 100));
    }

    #[test]
    fn test_bounding_rect() {
        let pts = vec![
            Point::new(10, 20),
            Point::new(50, 20),
            Point::new(50, 60),
            Point::new(10, 60),
        ];
        assert_eq!(bounding_rect(&pts), (10, 20, 40, 40));
    }
}
