//! Image Normalization Layer
//!
//! Executes the perspective warp and the best-effort enhancement and
//! QR-masking passes. All pixel-level primitives come from
//! `image`/`imageproc`; failures in the optional passes fall back to the
//! unmodified image, never to an error.

pub mod enhance;
pub mod qr_mask;
pub mod warp;

pub use enhance::enhance_for_ocr;
pub use qr_mask::{mask_qr_codes, MaskedRegion};
pub use warp::apply_warp;
