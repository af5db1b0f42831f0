//! BloodClan CLI: fingerprint blood-group prediction from the command line.
//!
//! Set BLOODCLAN_API_URL (or API_URL) to point at the prediction service.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::Context;
use bloodclan_api_client::PredictionClient;
use bloodclan_cli::{init_tracing, print_json, select_predictor, ConsoleDonorRegistration, ErrorReport};
use bloodclan_core::{
    BloodGroup, DonorPrefill, Interpretation, PipelineConfig, QualityReport, UploadAreaId,
    UploadPolicyKind, UploadedImage,
};
use bloodclan_processing::{
    assess, load_image_file, FingerprintPipeline, IntakePolicy, PipelineError, PredictionOutcome,
};
use clap::{Parser, Subcommand};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "bloodclan", about = "BloodClan fingerprint prediction CLI")]
struct Cli {
    /// Prediction service base URL (overrides BLOODCLAN_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a fingerprint image and report its local quality
    Check {
        /// Path to the fingerprint image
        file: PathBuf,
        /// Upload size policy: primary or secondary
        #[arg(long)]
        policy: Option<UploadPolicyKind>,
        /// Declared media type (defaults to one derived from the extension)
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Validate, assess and submit a fingerprint image for prediction
    Predict {
        /// Path to the fingerprint image
        file: PathBuf,
        /// Upload area identifier
        #[arg(long, default_value = "modal")]
        area: String,
        /// Upload size policy: primary or secondary
        #[arg(long)]
        policy: Option<UploadPolicyKind>,
        /// Declared media type (defaults to one derived from the extension)
        #[arg(long)]
        content_type: Option<String>,
        /// Fall back to simulated predictions when the service is down
        #[arg(long)]
        simulate_when_unavailable: bool,
    },
    /// Probe the prediction service
    Health,
    /// Show blood-group compatibility
    Compat {
        /// Blood group, e.g. "O-" (all groups when omitted)
        group: Option<String>,
    },
}

#[derive(Serialize)]
struct CheckReport {
    file: String,
    content_type: String,
    byte_size: usize,
    policy: String,
    quality: Option<QualityReport>,
}

#[derive(Serialize)]
struct PredictReport {
    area: UploadAreaId,
    quality: Option<QualityReport>,
    interpretation: Interpretation,
    low_confidence_message: Option<String>,
    donor_registration: Option<DonorPrefill>,
}

async fn load(path: &Path, content_type: Option<String>) -> anyhow::Result<UploadedImage> {
    let mut image = load_image_file(path)
        .await
        .with_context(|| format!("Failed to read file: {}", path.display()))?;
    if let Some(content_type) = content_type {
        image.content_type = content_type;
    }
    Ok(image)
}

fn fail(err: &PipelineError) -> anyhow::Error {
    if let Err(e) = print_json(&ErrorReport::from_error(err)) {
        tracing::error!(error = %e, "Failed to print error report");
    }
    anyhow::anyhow!("{}", err)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = PipelineConfig::from_env().context("Invalid BloodClan configuration")?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_string();
        config.validate()?;
    }

    match cli.command {
        Commands::Check {
            file,
            policy,
            content_type,
        } => {
            let kind = policy.unwrap_or(config.upload_policy);
            let image = load(&file, content_type).await?;
            IntakePolicy::for_kind(kind)
                .validate(Some(&image))
                .map_err(|e| fail(&PipelineError::from(e)))?;

            let quality = match assess(&image).await {
                Ok(report) => Some(report),
                Err(err) => {
                    tracing::warn!(error = %err, "Quality assessment unavailable");
                    None
                }
            };

            print_json(&CheckReport {
                file: file.display().to_string(),
                content_type: image.content_type.clone(),
                byte_size: image.byte_size(),
                policy: kind.to_string(),
                quality,
            })?;
        }
        Commands::Predict {
            file,
            area,
            policy,
            content_type,
            simulate_when_unavailable,
        } => {
            config.simulate_when_unavailable |= simulate_when_unavailable;
            let kind = policy.unwrap_or(config.upload_policy);
            let area = UploadAreaId::new(area);
            let image = load(&file, content_type).await?;

            let registration = Arc::new(ConsoleDonorRegistration::new());
            let pipeline =
                FingerprintPipeline::new(IntakePolicy::for_kind(kind), select_predictor(&config).await?)
                    .with_registration(registration.clone());

            pipeline
                .select(&area, Some(image))
                .map_err(|e| fail(&e))?;

            let (quality, outcome) = tokio::join!(pipeline.assess(&area), pipeline.predict(&area));
            let quality = quality.map_err(|e| fail(&e))?;

            let interpretation = match outcome.map_err(|e| fail(&e))? {
                PredictionOutcome::Applied(interpretation) => interpretation,
                PredictionOutcome::Stale => {
                    anyhow::bail!("Prediction was superseded before it completed")
                }
            };

            print_json(&PredictReport {
                area,
                quality,
                low_confidence_message: interpretation.low_confidence().map(|m| m.to_string()),
                interpretation,
                donor_registration: registration.prefill(),
            })?;
        }
        Commands::Health => {
            let client = PredictionClient::from_config(&config)?;
            let health = client
                .health()
                .await
                .map_err(|e| fail(&PipelineError::from(e)))?;
            print_json(&serde_json::json!({
                "available": health.is_healthy(),
                "health": health,
            }))?;
        }
        Commands::Compat { group } => match group {
            Some(label) => {
                let group = BloodGroup::from_str(&label)?;
                print_json(&group.compatibility())?;
            }
            None => {
                let table: Vec<_> = BloodGroup::ALL.iter().map(|g| g.compatibility()).collect();
                print_json(&table)?;
            }
        },
    }

    Ok(())
}
