//! Engine orchestration and result fusion
//!
//! Initialization waits for all engines or a global ceiling, whichever
//! comes first; engines that miss the ceiling are excluded but not fatal.
//! Recognition fans out to every ready engine with a per-call timeout and
//! fuses the surviving results by confidence x weight.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::GrayImage;
use tokio::task::JoinSet;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::engine::{EngineStatus, OcrEngineResult, RecognitionEngine};
use super::postprocess::correct_medication_text;
use crate::config::OcrSettings;
use crate::error::ScanError;

struct RegisteredEngine {
    engine: Arc<dyn RecognitionEngine>,
    weight: f32,
    ready: bool,
}

/// Fused recognition output. Selection is deterministic for identical
/// engine outputs: strictly greatest confidence x weight wins, first
/// registered wins exact ties.
#[derive(Debug, Clone)]
pub struct CombinedOcrResult {
    pub text: String,
    pub confidence: f32,
    pub engine_used: String,
    pub processing_time_ms: u64,
    /// Every individual engine result, in registration order, for audit.
    pub all_results: Vec<OcrEngineResult>,
}

/// Runs registered engines concurrently and fuses their results.
pub struct OcrOrchestrator {
    engines: Vec<RegisteredEngine>,
    settings: OcrSettings,
}

impl OcrOrchestrator {
    pub fn new(settings: OcrSettings) -> Self {
        Self {
            engines: Vec::new(),
            settings,
        }
    }

    /// Add an engine to the registry. Weight below or equal to zero is
    /// clamped to a minimal positive trust.
    pub fn register(&mut self, engine: Arc<dyn RecognitionEngine>) {
        let weight = engine.weight().max(f32::EPSILON);
        debug!(id = engine.id(), weight, "Engine registered");
        self.engines.push(RegisteredEngine {
            engine,
            weight,
            ready: false,
        });
    }

    /// Initialize all registered engines concurrently, waiting until every
    /// initialization settles or the global ceiling elapses. Engines not
    /// ready in time stay excluded; fails only when zero engines are ready.
    pub async fn initialize(&mut self) -> Result<(), ScanError> {
        if self.engines.is_empty() {
            return Err(ScanError::AllEnginesFailed);
        }

        let ceiling = Duration::from_secs(self.settings.init_timeout_secs);
        let mut tasks: JoinSet<(usize, anyhow::Result<()>)> = JoinSet::new();
        for (index, registered) in self.engines.iter().enumerate() {
            let engine = Arc::clone(&registered.engine);
            tasks.spawn(async move { (index, engine.initialize().await) });
        }

        let deadline = Instant::now() + ceiling;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match timeout(remaining, tasks.join_next()).await {
                Ok(Some(Ok((index, Ok(()))))) => {
                    self.engines[index].ready = true;
                    info!(id = self.engines[index].engine.id(), "Engine initialized");
                }
                Ok(Some(Ok((index, Err(error))))) => {
                    warn!(
                        id = self.engines[index].engine.id(),
                        %error,
                        "Engine initialization failed"
                    );
                }
                Ok(Some(Err(join_error))) => {
                    warn!(%join_error, "Engine initialization task panicked");
                }
                // All tasks settled.
                Ok(None) => break,
                // Ceiling reached; stragglers stay excluded.
                Err(_) => {
                    warn!(
                        ceiling_secs = self.settings.init_timeout_secs,
                        "Initialization ceiling reached"
                    );
                    break;
                }
            }
        }
        tasks.abort_all();

        if self.engines.iter().any(|e| e.ready) {
            Ok(())
        } else {
            Err(ScanError::AllEnginesFailed)
        }
    }

    /// Recognize text with every ready engine and fuse the results.
    pub async fn recognize(&self, image: &GrayImage) -> Result<CombinedOcrResult, ScanError> {
        let ready: Vec<(usize, &RegisteredEngine)> = self
            .engines
            .iter()
            .enumerate()
            .filter(|(_, e)| e.ready)
            .collect();
        if ready.is_empty() {
            return Err(ScanError::AllEnginesFailed);
        }

        let per_call = Duration::from_secs(self.settings.recognize_timeout_secs);
        let shared = Arc::new(image.clone());

        let mut tasks: JoinSet<(usize, Result<OcrEngineResult, ScanError>)> = JoinSet::new();
        for (index, registered) in &ready {
            let engine = Arc::clone(&registered.engine);
            let image = Arc::clone(&shared);
            let index = *index;
            tasks.spawn(async move {
                let id = engine.id().to_string();
                let started = Instant::now();
                // A timed-out engine's eventual late result is dropped with
                // the future; it is never merged.
                let outcome = match timeout(per_call, engine.recognize(&image)).await {
                    Ok(Ok(output)) => Ok(OcrEngineResult {
                        engine_id: id,
                        text: output.text,
                        confidence: output.confidence,
                        processing_time_ms: started.elapsed().as_millis() as u64,
                    }),
                    Ok(Err(error)) => Err(ScanError::EngineError {
                        engine: id,
                        message: error.to_string(),
                    }),
                    Err(_) => Err(ScanError::EngineTimeout {
                        engine: id,
                        timeout_ms: per_call.as_millis() as u64,
                    }),
                };
                (index, outcome)
            });
        }

        let mut indexed: Vec<(usize, OcrEngineResult)> = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, Ok(result))) => indexed.push((index, result)),
                Ok((_, Err(error))) => warn!(%error, "Engine dropped from result set"),
                Err(join_error) => warn!(%join_error, "Recognition task panicked"),
            }
        }

        if indexed.is_empty() {
            return Err(ScanError::AllEnginesFailed);
        }

        // Registration order keeps fusion deterministic regardless of task
        // completion order.
        indexed.sort_by_key(|(index, _)| *index);

        let mut best_index = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (position, (engine_index, result)) in indexed.iter().enumerate() {
            let score = result.confidence * self.engines[*engine_index].weight;
            if score > best_score {
                best_score = score;
                best_index = position;
            }
        }

        let all_results: Vec<OcrEngineResult> =
            indexed.into_iter().map(|(_, result)| result).collect();
        let best = &all_results[best_index];

        let mut text = best.text.clone();
        if self.settings.medication_mode {
            text = correct_medication_text(&text);
        }

        info!(
            engine = %best.engine_id,
            confidence = best.confidence,
            engines_succeeded = all_results.len(),
            "Recognition fused"
        );

        Ok(CombinedOcrResult {
            text,
            confidence: best.confidence,
            engine_used: best.engine_id.clone(),
            processing_time_ms: best.processing_time_ms,
            all_results,
        })
    }

    /// Registry snapshot for callers that surface engine health.
    pub fn engine_status(&self) -> Vec<EngineStatus> {
        self.engines
            .iter()
            .map(|e| EngineStatus {
                id: e.engine.id().to_string(),
                weight: e.weight,
                ready: e.ready,
            })
            .collect()
    }
}
