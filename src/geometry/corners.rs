//! Corner extraction
//!
//! Reduces candidate polygons to exactly four canonically ordered corners.
//! The reduction is deliberately greedy (nearest hull point per bounding-box
//! corner, list-order tie-break) to keep extraction behavior stable on real
//! scans.

use image::GrayImage;
use imageproc::contours::find_contours;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::geometry::{approximate_polygon_dp, arc_length, convex_hull};
use imageproc::morphology::{dilate, erode};
use imageproc::point::Point;
use tracing::debug;

use super::{CornerSet, ImageSize, Point2D, ScanResult};
use crate::config::GeometrySettings;

/// Reduce candidate polygons (already contour-approximated upstream) to a
/// document quadrilateral.
///
/// Polygons below `min_area_ratio` of the image area are noise; among the
/// survivors the largest one with 4-6 vertices wins. More than 4 vertices
/// are reduced via [`find_four_corners`].
pub fn reduce_polygons(
    polygons: &[Vec<Point2D>],
    width: u32,
    height: u32,
    min_area_ratio: f64,
) -> ScanResult {
    let image_size = ImageSize { width, height };
    let min_area = image_size.area() * min_area_ratio;

    let mut best: Option<(&Vec<Point2D>, f64)> = None;
    for polygon in polygons {
        let area = polygon_area(polygon);
        if area < min_area {
            continue;
        }
        if !(4..=6).contains(&polygon.len()) {
            continue;
        }
        if best.map_or(true, |(_, best_area)| area > best_area) {
            best = Some((polygon, area));
        }
    }

    let corners = match best {
        Some((polygon, area)) => {
            debug!(
                vertices = polygon.len(),
                area_pct = area / image_size.area() * 100.0,
                "Document candidate selected"
            );
            let reduced = if polygon.len() > 4 {
                find_four_corners(polygon)
            } else {
                polygon.clone()
            };
            CornerSet::from_points(&reduced).ok()
        }
        None => None,
    };

    ScanResult {
        corners,
        image_size,
    }
}

/// Full detection path: runs the upstream image primitives (blur, Canny,
/// dilate/erode gap closing, contour tracing, polygon approximation) and
/// feeds the resulting polygons through [`reduce_polygons`].
pub fn detect_document(gray: &GrayImage, settings: &GeometrySettings) -> ScanResult {
    let (width, height) = gray.dimensions();

    let blurred = gaussian_blur_f32(gray, settings.blur_sigma);
    let edges = canny(&blurred, settings.canny_low, settings.canny_high);

    // Close gaps in the document outline before contour tracing.
    let closed = erode(&dilate(&edges, Norm::LInf, 2), Norm::LInf, 2);

    let contours = find_contours::<i32>(&closed);
    debug!(contour_count = contours.len(), "Contours traced");

    let polygons: Vec<Vec<Point2D>> = contours
        .iter()
        .filter(|c| c.points.len() >= 4)
        .map(|c| {
            let perimeter = arc_length(&c.points, true);
            approximate_polygon_dp(&c.points, 0.02 * perimeter, true)
                .into_iter()
                .map(|p| Point2D::new(p.x as f32, p.y as f32))
                .collect()
        })
        .collect();

    reduce_polygons(&polygons, width, height, settings.min_area_ratio)
}

/// Reduce a polygon with more than 4 vertices to its 4 corner-most points:
/// convex hull first, then for each axis-aligned bounding-box corner the
/// hull point nearest to it (ties broken by list order).
pub fn find_four_corners(points: &[Point2D]) -> Vec<Point2D> {
    let hull_input: Vec<Point<i32>> = points
        .iter()
        .map(|p| Point::new(p.x.round() as i32, p.y.round() as i32))
        .collect();
    let hull: Vec<Point2D> = convex_hull(hull_input)
        .into_iter()
        .map(|p| Point2D::new(p.x as f32, p.y as f32))
        .collect();

    if hull.len() <= 4 {
        return hull;
    }

    let min_x = hull.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = hull.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = hull.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = hull.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

    let targets = [
        Point2D::new(min_x, min_y),
        Point2D::new(max_x, min_y),
        Point2D::new(max_x, max_y),
        Point2D::new(min_x, max_y),
    ];

    targets
        .iter()
        .map(|target| {
            let mut closest = hull[0];
            let mut min_dist = f32::INFINITY;
            for point in &hull {
                let dist = point.distance(target);
                if dist < min_dist {
                    min_dist = dist;
                    closest = *point;
                }
            }
            closest
        })
        .collect()
}

/// Order four points canonically: sort by polar angle about the centroid,
/// then rotate so the point with minimum x+y (top-left) comes first. The
/// result is [TL, TR, BR, BL] independent of the original winding.
pub fn order_corners(corners: &mut [Point2D; 4]) {
    let cx = corners.iter().map(|p| p.x).sum::<f32>() / 4.0;
    let cy = corners.iter().map(|p| p.y).sum::<f32>() / 4.0;

    corners.sort_by(|a, b| {
        let angle_a = (a.y - cy).atan2(a.x - cx);
        let angle_b = (b.y - cy).atan2(b.x - cx);
        angle_a.partial_cmp(&angle_b).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut tl_index = 0;
    let mut min_sum = f32::INFINITY;
    for (i, p) in corners.iter().enumerate() {
        let sum = p.x + p.y;
        if sum < min_sum {
            min_sum = sum;
            tl_index = i;
        }
    }

    corners.rotate_left(tl_index);
}

/// Signed shoelace area, absolute value.
fn polygon_area(points: &[Point2D]) -> f64 {
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
