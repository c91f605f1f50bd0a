//! medplan-scan - Digitizes photographed German medication plans
//!
//! Takes a plan photo (or already-recognized text), runs the scan
//! pipeline and prints the plan in one of the supported formats.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use medplan_scan::config::{load_config, ScanConfig};
use medplan_scan::encode::{encode_bmp26, encode_bmp27, encode_bmp30};
use medplan_scan::extract::extract_plan;
use medplan_scan::model::MedicationPlan;
use medplan_scan::pipeline::ScanPipeline;

/// medplan-scan - German medication plan digitizer
#[derive(Parser, Debug)]
#[command(name = "medplan-scan")]
#[command(about = "Digitizes photographed German medication plans into structured BMP documents")]
struct Args {
    /// Photo of a medication plan
    image: Option<PathBuf>,

    /// Parse already-recognized text from this file instead of an image
    #[arg(long, conflicts_with = "image")]
    text: Option<PathBuf>,

    /// Configuration file (TOML); defaults are used when absent
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: Format,

    /// Write the normalized image to this path
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Compact attribute XML (v026)
    Bmp26,
    /// Verbose element XML (v027)
    Bmp27,
    /// Delimited QR payload (v030)
    Bmp30,
    /// Plain JSON
    Json,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();
    let config = load_or_default_config(args.config.as_deref());

    let plan = if let Some(text_path) = &args.text {
        let text = std::fs::read_to_string(text_path)
            .with_context(|| format!("failed to read {}", text_path.display()))?;
        extract_plan(&text)
    } else if let Some(image_path) = &args.image {
        scan_image(image_path, &config, args.output.as_deref()).await?
    } else {
        bail!("either an image path or --text must be given");
    };

    println!("{}", render(&plan, args.format)?);
    Ok(())
}

/// Scan a plan photo via the remote vision-language service. Local engine
/// registration is a library concern; the CLI always uses the remote path.
async fn scan_image(
    path: &Path,
    config: &ScanConfig,
    output: Option<&Path>,
) -> Result<MedicationPlan> {
    let image = image::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?
        .to_luma8();
    info!(path = %path.display(), "Image loaded");

    let pipeline = ScanPipeline::new(config.clone());
    let (plan, normalized) = pipeline
        .process_remote(&image)
        .await
        .context("remote recognition failed")?;

    if let Some(output) = output {
        normalized
            .image
            .save(output)
            .with_context(|| format!("failed to write {}", output.display()))?;
        info!(path = %output.display(), "Normalized image written");
    }

    Ok(plan)
}

fn render(plan: &MedicationPlan, format: Format) -> Result<String> {
    Ok(match format {
        Format::Bmp26 => encode_bmp26(plan),
        Format::Bmp27 => encode_bmp27(plan),
        Format::Bmp30 => encode_bmp30(plan),
        Format::Json => serde_json::to_string_pretty(plan)?,
    })
}

/// Load configuration from file or fall back to defaults.
fn load_or_default_config(path: Option<&Path>) -> ScanConfig {
    if let Some(path) = path {
        match load_config(path) {
            Ok(config) => {
                info!(path = %path.display(), "Configuration loaded");
                return config;
            }
            Err(error) => {
                tracing::warn!(%error, "Failed to load configuration, using defaults");
            }
        }
    }
    ScanConfig::default()
}
