//! Scan Configuration
//!
//! Pipeline tuning knobs stored in TOML format.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Document detection settings
    pub geometry: GeometrySettings,
    /// Enhancement settings
    pub enhance: EnhanceSettings,
    /// OCR orchestration settings
    pub ocr: OcrSettings,
    /// Remote vision-language engine settings
    pub remote: RemoteSettings,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            geometry: GeometrySettings::default(),
            enhance: EnhanceSettings::default(),
            ocr: OcrSettings::default(),
            remote: RemoteSettings::default(),
        }
    }
}

/// Document detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeometrySettings {
    /// Minimum polygon area as a fraction of total image area. Smaller
    /// polygons are rejected as noise.
    pub min_area_ratio: f64,
    /// Gaussian blur sigma applied before edge detection
    pub blur_sigma: f32,
    /// Canny edge detection thresholds
    pub canny_low: f32,
    pub canny_high: f32,
}

impl Default for GeometrySettings {
    fn default() -> Self {
        Self {
            min_area_ratio: 0.05,
            blur_sigma: 1.4,
            canny_low: 100.0,
            canny_high: 200.0,
        }
    }
}

/// Enhancement settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnhanceSettings {
    /// Enable the enhancement pass (deskew, contrast, sharpen, binarize)
    pub enabled: bool,
    /// Estimate skew from detected lines and rotate before enhancing
    pub deskew: bool,
    /// Number of detected lines considered for skew estimation
    pub max_deskew_lines: usize,
    /// Hough accumulator votes required for a line
    pub line_vote_threshold: u32,
    /// Rotations below this magnitude (degrees) are treated as noise
    pub min_rotation_degrees: f32,
    /// Apply median denoising before binarization
    pub denoise: bool,
}

impl Default for EnhanceSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            deskew: true,
            max_deskew_lines: 20,
            line_vote_threshold: 100,
            min_rotation_degrees: 1.0,
            denoise: true,
        }
    }
}

/// OCR orchestration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    /// Ceiling for concurrent engine initialization, in seconds. Engines
    /// not ready by then are excluded from recognition.
    pub init_timeout_secs: u64,
    /// Per-engine recognition timeout, in seconds
    pub recognize_timeout_secs: u64,
    /// Apply medication-specific text corrections to the fused result
    pub medication_mode: bool,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            init_timeout_secs: 10,
            recognize_timeout_secs: 120,
            medication_mode: true,
        }
    }
}

/// Remote vision-language engine settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Base URL of the Ollama-compatible inference service
    pub base_url: String,
    /// Model identifier
    pub model: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "qwen2.5vl:7b".to_string(),
            timeout_secs: 300,
        }
    }
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<ScanConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: ScanConfig = toml::from_str(&content)?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &ScanConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}
