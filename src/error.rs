//! Error types for the scan pipeline
//!
//! Per-engine failures are absorbed by the orchestrator and never surface
//! to callers as long as at least one engine produced a result.

use thiserror::Error;

/// Errors produced by the scan core.
#[derive(Debug, Error)]
pub enum ScanError {
    /// No quadrilateral covering enough of the frame was found. Callers may
    /// proceed with the uncropped image; this is not fatal.
    #[error("no document detected in image")]
    NoDocumentDetected,

    /// The perspective planner requires exactly four corner points.
    #[error("expected 4 corner points, got {0}")]
    InvalidCornerCount(usize),

    /// The corner quadrilateral is degenerate and no projective transform
    /// could be computed from it.
    #[error("failed to compute perspective transform from corners")]
    WarpFailed,

    /// Zero engines were ready, or every ready engine failed or timed out.
    #[error("all OCR engines failed")]
    AllEnginesFailed,

    /// A single engine exceeded its per-call timeout. Logged and excluded,
    /// never propagated while siblings succeed.
    #[error("engine '{engine}' timed out after {timeout_ms}ms")]
    EngineTimeout { engine: String, timeout_ms: u64 },

    /// A single engine returned an error. Logged and excluded.
    #[error("engine '{engine}' failed: {message}")]
    EngineError { engine: String, message: String },

    /// The normalized image could not be re-encoded for upload.
    #[error("image encoding failed: {0}")]
    ImageEncoding(#[from] image::ImageError),

    /// The remote vision-language service could not be reached or returned
    /// a transport-level error.
    #[error("remote recognition request failed: {0}")]
    RemoteRequest(#[from] reqwest::Error),

    /// The remote service answered, but no parseable JSON object could be
    /// recovered from its response text.
    #[error("remote response contained no parseable plan: {0}")]
    RemoteResponse(String),
}
