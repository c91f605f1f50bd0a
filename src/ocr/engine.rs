//! Recognition engine contract
//!
//! Engines are pluggable: anything that can initialize itself and turn an
//! image into text joins the orchestrator's registry. Engines report a
//! static trust weight used during result fusion.

use async_trait::async_trait;
use image::GrayImage;

/// Raw output of one engine invocation.
#[derive(Debug, Clone)]
pub struct EngineOutput {
    /// Full recognized text.
    pub text: String,
    /// Engine-reported confidence, 0..100.
    pub confidence: f32,
    /// Per-line breakdown when the engine provides one.
    pub lines: Vec<RecognizedLine>,
}

/// One recognized text line.
#[derive(Debug, Clone)]
pub struct RecognizedLine {
    pub text: String,
    pub confidence: f32,
}

/// A text-recognition engine.
///
/// `initialize` is called once, concurrently with the other engines, under
/// the orchestrator's global ceiling. `recognize` races against the
/// per-call timeout; a late result is discarded, so engines need no
/// cooperative cancellation.
#[async_trait]
pub trait RecognitionEngine: Send + Sync {
    /// Stable identifier used in logs and audit results.
    fn id(&self) -> &str;

    /// Static trust weight multiplied into the fusion score. Must be > 0.
    fn weight(&self) -> f32 {
        1.0
    }

    async fn initialize(&self) -> anyhow::Result<()>;

    async fn recognize(&self, image: &GrayImage) -> anyhow::Result<EngineOutput>;
}

/// Registry status of one engine, for callers that surface engine health.
#[derive(Debug, Clone)]
pub struct EngineStatus {
    pub id: String,
    pub weight: f32,
    pub ready: bool,
}

/// Result of one successful engine invocation. Failed engines produce no
/// result at all, not a zero-confidence one.
#[derive(Debug, Clone)]
pub struct OcrEngineResult {
    pub engine_id: String,
    pub text: String,
    pub confidence: f32,
    pub processing_time_ms: u64,
}
