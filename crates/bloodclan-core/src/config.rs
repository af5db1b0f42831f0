//! Configuration module
//!
//! Pipeline settings are read from the environment (optionally seeded from a
//! `.env` file). Numeric values that fail to parse fall back to their defaults.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:5000";
const PREDICT_TIMEOUT_SECS: u64 = 30;
const HEALTH_TIMEOUT_SECS: u64 = 5;
const SIMULATED_THRESHOLD: f64 = 0.65;

/// Which file-intake size policy the pipeline applies to every upload area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadPolicyKind {
    /// 16 MiB maximum, 1 KiB minimum.
    #[default]
    Primary,
    /// 5 MiB maximum, no minimum.
    Secondary,
}

impl FromStr for UploadPolicyKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "primary" => Ok(UploadPolicyKind::Primary),
            "secondary" => Ok(UploadPolicyKind::Secondary),
            other => Err(anyhow::anyhow!(
                "Unknown upload policy '{}' (expected 'primary' or 'secondary')",
                other
            )),
        }
    }
}

impl fmt::Display for UploadPolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadPolicyKind::Primary => f.write_str("primary"),
            UploadPolicyKind::Secondary => f.write_str("secondary"),
        }
    }
}

/// Parse an on/off switch. Unrecognized spellings are an error rather than `false`.
fn parse_flag(name: &str, value: &str) -> Result<bool, anyhow::Error> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow::anyhow!(
            "{} must be a boolean such as 'true' or 'false' (got '{}')",
            name,
            other
        )),
    }
}

#[derive(Clone, Debug)]
pub struct PipelineConfig {
    pub api_url: String,
    pub predict_timeout_secs: u64,
    pub health_timeout_secs: u64,
    pub upload_policy: UploadPolicyKind,
    // Degraded mode: fall back to simulated predictions when the health probe fails
    pub simulate_when_unavailable: bool,
    pub simulated_threshold: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            predict_timeout_secs: PREDICT_TIMEOUT_SECS,
            health_timeout_secs: HEALTH_TIMEOUT_SECS,
            upload_policy: UploadPolicyKind::Primary,
            simulate_when_unavailable: false,
            simulated_threshold: SIMULATED_THRESHOLD,
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("BLOODCLAN_API_URL")
            .or_else(|| lookup("API_URL"))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let upload_policy = match lookup("BLOODCLAN_UPLOAD_POLICY") {
            Some(value) => value.parse()?,
            None => UploadPolicyKind::Primary,
        };

        let simulated_threshold = lookup("BLOODCLAN_SIMULATED_THRESHOLD")
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|t| (0.0..=1.0).contains(t))
            .unwrap_or(SIMULATED_THRESHOLD);

        let config = PipelineConfig {
            api_url,
            predict_timeout_secs: lookup("BLOODCLAN_PREDICT_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(PREDICT_TIMEOUT_SECS),
            health_timeout_secs: lookup("BLOODCLAN_HEALTH_TIMEOUT_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(HEALTH_TIMEOUT_SECS),
            upload_policy,
            simulate_when_unavailable: match lookup("BLOODCLAN_SIMULATE_WHEN_UNAVAILABLE") {
                Some(value) => parse_flag("BLOODCLAN_SIMULATE_WHEN_UNAVAILABLE", &value)?,
                None => false,
            },
            simulated_threshold,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(anyhow::anyhow!(
                "BLOODCLAN_API_URL must start with http:// or https:// (got '{}')",
                self.api_url
            ));
        }
        if self.predict_timeout_secs == 0 {
            return Err(anyhow::anyhow!(
                "BLOODCLAN_PREDICT_TIMEOUT_SECS must be greater than zero"
            ));
        }
        Ok(())
    }

    pub fn predict_timeout(&self) -> Duration {
        Duration::from_secs(self.predict_timeout_secs)
    }

    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}
