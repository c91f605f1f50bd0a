//! medplan-scan - Digitizes photographed German medication plans
//!
//! Pipeline: document corner detection -> perspective correction ->
//! enhancement -> multi-engine OCR -> medication extraction ->
//! BMP 2.6 / 2.7 / 3.0 encoding.
//!
//! Low-level image primitives come from `image`/`imageproc`; text
//! recognition comes from pluggable engines registered with the
//! orchestrator (or the remote vision-language client). This crate only
//! orchestrates those collaborators and owns the parsing/encoding logic.

pub mod config;
pub mod encode;
pub mod error;
pub mod extract;
pub mod geometry;
pub mod imaging;
pub mod model;
pub mod ocr;
pub mod pipeline;

pub use error::ScanError;
pub use geometry::{CornerSet, Point2D, ScanResult};
pub use model::{DosingScheme, MedicationPlan, MedicationRecord, PatientInfo};
pub use ocr::{CombinedOcrResult, OcrOrchestrator, RecognitionEngine};
pub use pipeline::{ScanOutcome, ScanPipeline};
