//! Perspective warp execution
//!
//! Applies a [`WarpPlan`] via `imageproc`'s projective transform.

use image::{GrayImage, Luma};
use imageproc::geometric_transformations::{warp_into, Interpolation, Projection};
use tracing::debug;

use crate::error::ScanError;
use crate::geometry::WarpPlan;

/// Warp the document quadrilateral into an axis-aligned rectangle of the
/// planned dimensions. Out-of-quad pixels become white.
pub fn apply_warp(image: &GrayImage, plan: &WarpPlan) -> Result<GrayImage, ScanError> {
    let src: [(f32, f32); 4] = [
        (plan.source[0].x, plan.source[0].y),
        (plan.source[1].x, plan.source[1].y),
        (plan.source[2].x, plan.source[2].y),
        (plan.source[3].x, plan.source[3].y),
    ];
    let dst: [(f32, f32); 4] = [
        (plan.destination[0].x, plan.destination[0].y),
        (plan.destination[1].x, plan.destination[1].y),
        (plan.destination[2].x, plan.destination[2].y),
        (plan.destination[3].x, plan.destination[3].y),
    ];

    // from_control_points returns None for degenerate quadrilaterals.
    let projection = Projection::from_control_points(src, dst).ok_or(ScanError::WarpFailed)?;

    let mut output = GrayImage::new(plan.width, plan.height);
    warp_into(
        image,
        &projection,
        Interpolation::Bilinear,
        Luma([255u8]),
        &mut output,
    );

    debug!(width = plan.width, height = plan.height, "Perspective warp applied");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{plan_warp, CornerSet, Point2D};

    #[test]
    fn test_identity_warp_preserves_pixels() {
        let mut img = GrayImage::from_pixel(100, 80, Luma([255u8]));
        // 3x3 block so bilinear resampling cannot wash the marker out.
        for y in 39..42 {
            for x in 49..52 {
                img.put_pixel(x, y, Luma([0u8]));
            }
        }

        let corners = CornerSet::from_points(&[
            Point2D::new(0.0, 0.0),
            Point2D::new(99.0, 0.0),
            Point2D::new(99.0, 79.0),
            Point2D::new(0.0, 79.0),
        ])
        .unwrap();
        let plan = plan_warp(&corners);
        let warped = apply_warp(&img, &plan).unwrap();

        assert_eq!(warped.dimensions(), (99, 79));
        // The marked pixel stays in the middle of the output.
        assert!(warped.get_pixel(50, 40).0[0] < 128);
    }

    #[test]
    fn test_degenerate_corners_fail() {
        let img = GrayImage::new(10, 10);
        // All four source corners collinear - no projective transform exists.
        let plan = WarpPlan {
            width: 10,
            height: 10,
            source: [
                Point2D::new(0.0, 0.0),
                Point2D::new(1.0, 1.0),
                Point2D::new(2.0, 2.0),
                Point2D::new(3.0, 3.0),
            ],
            destination: [
                Point2D::new(0.0, 0.0),
                Point2D::new(9.0, 0.0),
                Point2D::new(9.0, 9.0),
                Point2D::new(0.0, 9.0),
            ],
        };
        assert!(matches!(apply_warp(&img, &plan), Err(ScanError::WarpFailed)));
    }
}
