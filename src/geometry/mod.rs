//! Document Geometry Layer
//!
//! Locates the plan quadrilateral in a photo and plans the perspective
//! correction. Contour tracing, polygon approximation and convex hull
//! computation come from `imageproc`; the selection and ordering logic
//! lives here.

pub mod corners;
pub mod perspective;

pub use corners::{detect_document, reduce_polygons};
pub use perspective::{plan_warp, WarpPlan};

use crate::error::ScanError;

/// Pixel coordinate, device-resolution scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2D {
    pub x: f32,
    pub y: f32,
}

impl Point2D {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point2D) -> f32 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// Exactly four corner points, always ordered
/// [top-left, top-right, bottom-right, bottom-left]. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerSet([Point2D; 4]);

impl CornerSet {
    /// Order the given points canonically and build the set. Fails with
    /// [`ScanError::InvalidCornerCount`] unless exactly 4 points are given.
    pub fn from_points(points: &[Point2D]) -> Result<Self, ScanError> {
        if points.len() != 4 {
            return Err(ScanError::InvalidCornerCount(points.len()));
        }
        let mut corners = [points[0], points[1], points[2], points[3]];
        corners::order_corners(&mut corners);
        Ok(Self(corners))
    }

    pub fn top_left(&self) -> Point2D {
        self.0[0]
    }

    pub fn top_right(&self) -> Point2D {
        self.0[1]
    }

    pub fn bottom_right(&self) -> Point2D {
        self.0[2]
    }

    pub fn bottom_left(&self) -> Point2D {
        self.0[3]
    }

    pub fn points(&self) -> &[Point2D; 4] {
        &self.0
    }
}

/// Source image dimensions carried alongside detection output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn area(&self) -> f64 {
        self.width as f64 * self.height as f64
    }
}

/// Outcome of document detection. `corners: None` means "no document
/// detected", a normal outcome rather than an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScanResult {
    pub corners: Option<CornerSet>,
    pub image_size: ImageSize,
}

impl ScanResult {
    /// Typed accessor for callers that cannot proceed without a document.
    pub fn require_corners(&self) -> Result<CornerSet, ScanError> {
        self.corners.ok_or(ScanError::NoDocumentDetected)
    }
}
