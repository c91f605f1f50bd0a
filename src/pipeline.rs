//! End-to-end scan pipeline
//!
//! Wires the stages together: QR masking, document detection, perspective
//! correction, enhancement, recognition and extraction. Detection and warp
//! failures degrade to the uncropped image instead of aborting; only a
//! fully failed recognition is fatal.

use std::sync::Arc;

use image::GrayImage;
use tracing::{info, warn};

use crate::config::ScanConfig;
use crate::error::ScanError;
use crate::extract::extract_plan;
use crate::geometry::corners::detect_document;
use crate::geometry::perspective::plan_warp;
use crate::geometry::CornerSet;
use crate::imaging::enhance::enhance_for_ocr;
use crate::imaging::qr_mask::{mask_qr_codes, MaskedRegion};
use crate::imaging::warp::apply_warp;
use crate::model::MedicationPlan;
use crate::ocr::{CombinedOcrResult, OcrOrchestrator, RecognitionEngine, RemoteVisionClient};

/// Geometry-normalized image plus what was found along the way.
#[derive(Debug, Clone)]
pub struct NormalizedScan {
    /// Masked and perspective-corrected image, uncropped when no document
    /// was detected.
    pub image: GrayImage,
    pub corners: Option<CornerSet>,
    pub masked_regions: Vec<MaskedRegion>,
}

/// Everything a scan session produces.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub plan: MedicationPlan,
    pub ocr: CombinedOcrResult,
    pub corners: Option<CornerSet>,
    pub masked_regions: Vec<MaskedRegion>,
    /// The enhanced image that was handed to the engines.
    pub image: GrayImage,
}

/// Owns the stage configuration and the engine registry.
pub struct ScanPipeline {
    config: ScanConfig,
    orchestrator: OcrOrchestrator,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig) -> Self {
        let orchestrator = OcrOrchestrator::new(config.ocr.clone());
        Self {
            config,
            orchestrator,
        }
    }

    pub fn register_engine(&mut self, engine: Arc<dyn RecognitionEngine>) {
        self.orchestrator.register(engine);
    }

    /// Initialize all registered engines. Must be called before
    /// [`process`](Self::process).
    pub async fn initialize(&mut self) -> Result<(), ScanError> {
        self.orchestrator.initialize().await
    }

    /// Run the full local pipeline: normalize, enhance, recognize, extract.
    pub async fn process(&self, image: &GrayImage) -> Result<ScanOutcome, ScanError> {
        let normalized = self.normalize(image);
        let enhanced = enhance_for_ocr(&normalized.image, &self.config.enhance);

        let ocr = self.orchestrator.recognize(&enhanced).await?;
        let plan = extract_plan(&ocr.text);

        info!(
            medications = plan.medications.len(),
            engine = %ocr.engine_used,
            "Scan complete"
        );

        Ok(ScanOutcome {
            plan,
            ocr,
            corners: normalized.corners,
            masked_regions: normalized.masked_regions,
            image: enhanced,
        })
    }

    /// Alternative recognition path: send the normalized image to the
    /// remote vision-language service, which returns a structured plan
    /// directly. The enhancement chain is skipped; binarization helps
    /// classical engines but degrades vision-language models.
    pub async fn process_remote(
        &self,
        image: &GrayImage,
    ) -> Result<(MedicationPlan, NormalizedScan), ScanError> {
        let normalized = self.normalize(image);
        let client = RemoteVisionClient::new(&self.config.remote)?;
        let plan = client.recognize_plan(&normalized.image).await?;
        info!(medications = plan.medications.len(), "Remote scan complete");
        Ok((plan, normalized))
    }

    /// Mask QR codes, then crop to the detected document. Both stages are
    /// best-effort; the uncropped masked image is the fallback.
    pub fn normalize(&self, image: &GrayImage) -> NormalizedScan {
        let (masked, masked_regions) = mask_qr_codes(image);

        let detection = detect_document(&masked, &self.config.geometry);
        let (warped, corners) = match detection.corners {
            Some(corners) => match apply_warp(&masked, &plan_warp(&corners)) {
                Ok(warped) => (warped, Some(corners)),
                Err(error) => {
                    warn!(%error, "Warp failed, continuing with uncropped image");
                    (masked, Some(corners))
                }
            },
            None => {
                warn!("No document detected, continuing with uncropped image");
                (masked, None)
            }
        };

        NormalizedScan {
            image: warped,
            corners,
            masked_regions,
        }
    }

    /// Registry snapshot, see [`OcrOrchestrator::engine_status`].
    pub fn engine_status(&self) -> Vec<crate::ocr::EngineStatus> {
        self.orchestrator.engine_status()
    }
}
