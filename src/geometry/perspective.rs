//! Perspective planning
//!
//! Computes the destination rectangle and point correspondence handed to
//! the warp primitive. Taking the larger of each pair of opposing edges
//! compensates for perspective foreshortening.

use super::{CornerSet, Point2D};
use crate::error::ScanError;

/// Source/destination correspondence for the external warp primitive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WarpPlan {
    /// Output rectangle dimensions in pixels.
    pub width: u32,
    pub height: u32,
    /// Document corners in the source image, TL/TR/BR/BL.
    pub source: [Point2D; 4],
    /// Fixed destination corners (0,0), (w-1,0), (w-1,h-1), (0,h-1).
    pub destination: [Point2D; 4],
}

/// Plan the perspective correction for an ordered corner set.
pub fn plan_warp(corners: &CornerSet) -> WarpPlan {
    let tl = corners.top_left();
    let tr = corners.top_right();
    let br = corners.bottom_right();
    let bl = corners.bottom_left();

    let width = tl.distance(&tr).max(br.distance(&bl)).round().max(1.0);
    let height = tl.distance(&bl).max(tr.distance(&br)).round().max(1.0);

    WarpPlan {
        width: width as u32,
        height: height as u32,
        source: [tl, tr, br, bl],
        destination: [
            Point2D::new(0.0, 0.0),
            Point2D::new(width - 1.0, 0.0),
            Point2D::new(width - 1.0, height - 1.0),
            Point2D::new(0.0, height - 1.0),
        ],
    }
}

/// Plan directly from unordered points. Fails with
/// [`ScanError::InvalidCornerCount`] unless exactly 4 points are given.
pub fn plan_warp_from_points(points: &[Point2D]) -> Result<WarpPlan, ScanError> {
    let corners = CornerSet::from_points(points)?;
    Ok(plan_warp(&corners))
}
