//! OCR Orchestration Layer
//!
//! Runs an open set of pluggable recognition engines concurrently, fuses
//! their output by confidence-weighted selection, and optionally corrects
//! common recognition confusions in medication plans. The remote
//! vision-language client is the alternative recognition path, returning a
//! structured plan directly.

pub mod engine;
pub mod orchestrator;
pub mod postprocess;
pub mod remote;

pub use engine::{EngineOutput, EngineStatus, OcrEngineResult, RecognitionEngine, RecognizedLine};
pub use orchestrator::{CombinedOcrResult, OcrOrchestrator};
pub use postprocess::correct_medication_text;
pub use remote::RemoteVisionClient;
