//! HTTP client for the BloodClan prediction service.
//!
//! Wraps `POST /api/model/predict` and `GET /api/model/health`, validates
//! responses strictly at the boundary and implements
//! [`Predictor`](bloodclan_core::Predictor) so the upload pipeline can drive it.
//! A [`SimulatedPredictor`] stands in when the service is down and degraded
//! mode is explicitly enabled.

pub mod api;
pub mod simulated;

pub use api::{HealthStatus, PredictResponse, HEALTH_PATH, PREDICT_PATH};
pub use simulated::SimulatedPredictor;

use anyhow::{Context, Result};
use bloodclan_core::PipelineConfig;
use reqwest::Client;
use std::time::Duration;

/// Default timeout for a prediction call.
pub const DEFAULT_PREDICT_TIMEOUT: Duration = Duration::from_secs(30);

/// Default timeout for the health probe.
pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// HTTP client for the prediction service.
#[derive(Clone, Debug)]
pub struct PredictionClient {
    client: Client,
    base_url: String,
    predict_timeout: Duration,
    health_timeout: Duration,
}

/// Builder for configuring a [`PredictionClient`].
#[derive(Debug)]
pub struct PredictionClientBuilder {
    base_url: String,
    predict_timeout: Duration,
    health_timeout: Duration,
    client: Option<Client>,
}

impl PredictionClientBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            predict_timeout: DEFAULT_PREDICT_TIMEOUT,
            health_timeout: DEFAULT_HEALTH_TIMEOUT,
            client: None,
        }
    }

    #[must_use]
    pub fn predict_timeout(mut self, timeout: Duration) -> Self {
        self.predict_timeout = timeout;
        self
    }

    #[must_use]
    pub fn health_timeout(mut self, timeout: Duration) -> Self {
        self.health_timeout = timeout;
        self
    }

    /// Use a custom reqwest Client (proxies, TLS settings).
    #[must_use]
    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn build(self) -> Result<PredictionClient> {
        // Timeouts are applied per request; the two endpoints use different bounds.
        let client = match self.client {
            Some(c) => c,
            None => Client::builder()
                .build()
                .context("Failed to create HTTP client")?,
        };

        Ok(PredictionClient {
            client,
            base_url: self.base_url,
            predict_timeout: self.predict_timeout,
            health_timeout: self.health_timeout,
        })
    }
}

impl PredictionClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        PredictionClientBuilder::new(base_url).build()
    }

    pub fn builder(base_url: impl Into<String>) -> PredictionClientBuilder {
        PredictionClientBuilder::new(base_url)
    }

    pub fn from_config(config: &PipelineConfig) -> Result<Self> {
        PredictionClientBuilder::new(config.api_url.clone())
            .predict_timeout(config.predict_timeout())
            .health_timeout(config.health_timeout())
            .build()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn predict_timeout(&self) -> Duration {
        self.predict_timeout
    }

    pub fn health_timeout(&self) -> Duration {
        self.health_timeout
    }

    pub fn build_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.client
    }
}
