//! Shared helpers for the `bloodclan` binary.

use std::sync::{Arc, Mutex};

use anyhow::Context;
use bloodclan_api_client::{PredictionClient, SimulatedPredictor};
use bloodclan_core::{DonorPrefill, ErrorMetadata, PipelineConfig, Predictor};
use bloodclan_processing::DonorRegistration;
use serde::Serialize;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// User-facing rendering of any error that carries [`ErrorMetadata`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<&'static str>,
}

impl ErrorReport {
    pub fn from_error(err: &impl ErrorMetadata) -> Self {
        Self {
            code: err.error_code(),
            message: err.client_message(),
            recoverable: err.is_recoverable(),
            suggested_action: err.suggested_action(),
        }
    }
}

/// Registration form stand-in: remembers the latest unlock so it can be
/// printed once the command finishes.
#[derive(Default)]
pub struct ConsoleDonorRegistration {
    prefill: Mutex<Option<DonorPrefill>>,
}

impl ConsoleDonorRegistration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-filled values if registration is currently unlocked.
    pub fn prefill(&self) -> Option<DonorPrefill> {
        self.prefill
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl DonorRegistration for ConsoleDonorRegistration {
    fn unlock(&self, prefill: &DonorPrefill) {
        tracing::info!(
            group = %prefill.predicted_blood_group,
            confidence = prefill.confidence,
            "Donor registration unlocked"
        );
        *self
            .prefill
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(prefill.clone());
    }

    fn lock(&self) {
        *self
            .prefill
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = None;
    }
}

/// Pick the predictor for this run. The simulator is used only when degraded
/// mode is enabled and the health probe says the service is down.
pub async fn select_predictor(config: &PipelineConfig) -> anyhow::Result<Arc<dyn Predictor>> {
    let client = PredictionClient::from_config(config)?;

    if config.simulate_when_unavailable && !client.is_available().await {
        tracing::warn!(
            api_url = %config.api_url,
            threshold = config.simulated_threshold,
            "Prediction service unavailable; falling back to simulated predictions"
        );
        return Ok(Arc::new(SimulatedPredictor::new(config.simulated_threshold)));
    }

    Ok(Arc::new(client))
}
