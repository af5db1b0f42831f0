//! Prediction and health endpoints.
//!
//! Wire types mirror the service's JSON. A successful prediction body is only
//! turned into a [`PredictionResult`] after every field has been checked.

use async_trait::async_trait;
use bloodclan_core::{BloodGroup, PredictError, PredictionResult, Predictor, UploadedImage};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::PredictionClient;

pub const PREDICT_PATH: &str = "/api/model/predict";
pub const HEALTH_PATH: &str = "/api/model/health";

/// Multipart field carrying the fingerprint file.
const FINGERPRINT_FIELD: &str = "fingerprint";

/// Success body of `POST /api/model/predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictResponse {
    pub predicted_group: String,
    pub confidence: f64,
    pub allowed_to_donate: bool,
    pub threshold: f64,
    #[serde(default)]
    pub model_accuracy: Option<serde_json::Value>,
    #[serde(default)]
    pub confidence_percentage: Option<f64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl PredictResponse {
    /// Check labels and ranges. Anything out of contract is a service error.
    pub fn into_result(self) -> Result<PredictionResult, PredictError> {
        let predicted_group: BloodGroup = self.predicted_group.parse().map_err(|_| {
            PredictError::ServiceError(format!(
                "Unknown blood group label '{}' in prediction response",
                self.predicted_group
            ))
        })?;

        if !is_unit_interval(self.confidence) {
            return Err(PredictError::ServiceError(format!(
                "Confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if !is_unit_interval(self.threshold) {
            return Err(PredictError::ServiceError(format!(
                "Threshold {} outside [0, 1]",
                self.threshold
            )));
        }

        let model_accuracy = self.model_accuracy.and_then(|value| match value {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(PredictionResult {
            predicted_group,
            confidence: self.confidence,
            allowed_to_donate: self.allowed_to_donate,
            threshold: self.threshold,
            model_accuracy,
            message: self.message,
            simulated: false,
        })
    }
}

fn is_unit_interval(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Failure body shared by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /api/model/health`, plus the HTTP status it came with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    #[serde(skip)]
    pub http_status: u16,
    pub status: String,
    #[serde(default)]
    pub model_loaded: bool,
    #[serde(default)]
    pub accuracy: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        (200..300).contains(&self.http_status) && self.status == "healthy"
    }
}

fn timeout_secs(timeout: Duration) -> u64 {
    timeout.as_secs_f64().ceil() as u64
}

/// Map a transport failure onto the prediction error taxonomy.
fn transport_error(err: reqwest::Error, timeout: Duration) -> PredictError {
    if err.is_timeout() {
        PredictError::Timeout {
            timeout_secs: timeout_secs(timeout),
        }
    } else if err.is_connect() {
        PredictError::NetworkUnavailable(err.to_string())
    } else {
        PredictError::Unknown(err.to_string())
    }
}

impl PredictionClient {
    /// Upload one fingerprint image and return the validated classification.
    ///
    /// A single request bounded by the predict timeout; never retried here.
    pub async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, PredictError> {
        let part = Part::bytes(image.data.to_vec())
            .file_name(image.upload_file_name())
            .mime_str(&image.content_type)
            .map_err(|e| PredictError::Unknown(format!("Invalid content type: {}", e)))?;
        let form = Form::new().part(FINGERPRINT_FIELD, part);

        let response = self
            .http()
            .post(self.build_url(PREDICT_PATH))
            .timeout(self.predict_timeout())
            .multipart(form)
            .send()
            .await
            .map_err(|e| transport_error(e, self.predict_timeout()))?;

        let status = response.status();

        // The status alone decides 413; the body only adds detail when readable.
        if status == StatusCode::PAYLOAD_TOO_LARGE {
            let detail = match response.bytes().await {
                Ok(body) => serde_json::from_slice::<ErrorBody>(&body).map(|b| b.error).ok(),
                Err(e) => {
                    tracing::debug!(error = %e, "Could not read 413 response body");
                    None
                }
            };
            return Err(PredictError::PayloadTooLarge(
                detail.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            ));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.predict_timeout()))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&body) {
                Ok(ErrorBody { error }) => PredictError::ServiceError(error),
                Err(_) => PredictError::Unknown(format!("HTTP {}", status.as_u16())),
            });
        }

        let parsed: PredictResponse = serde_json::from_slice(&body).map_err(|e| {
            PredictError::ServiceError(format!("Malformed prediction response: {}", e))
        })?;
        parsed.into_result()
    }

    /// Probe the model service. Unhealthy answers with a readable body are
    /// returned as `Ok` so the caller can show the reported error.
    pub async fn health(&self) -> Result<HealthStatus, PredictError> {
        let response = self
            .http()
            .get(self.build_url(HEALTH_PATH))
            .timeout(self.health_timeout())
            .send()
            .await
            .map_err(|e| transport_error(e, self.health_timeout()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(e, self.health_timeout()))?;

        match serde_json::from_slice::<HealthStatus>(&body) {
            Ok(mut health) => {
                health.http_status = status.as_u16();
                Ok(health)
            }
            Err(e) if status.is_success() => Err(PredictError::ServiceError(format!(
                "Malformed health response: {}",
                e
            ))),
            Err(_) => Err(PredictError::Unknown(format!("HTTP {}", status.as_u16()))),
        }
    }

    /// True iff the probe answered 2xx with `status == "healthy"`.
    pub async fn is_available(&self) -> bool {
        match self.health().await {
            Ok(health) => health.is_healthy(),
            Err(err) => {
                tracing::debug!(error = %err, "Prediction service health probe failed");
                false
            }
        }
    }
}

#[async_trait]
impl Predictor for PredictionClient {
    async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, PredictError> {
        PredictionClient::predict(self, image).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(group: &str, confidence: f64, threshold: f64) -> PredictResponse {
        PredictResponse {
            predicted_group: group.to_string(),
            confidence,
            allowed_to_donate: confidence >= threshold,
            threshold,
            model_accuracy: Some(serde_json::json!("99.5%")),
            confidence_percentage: Some(confidence * 100.0),
            message: None,
        }
    }

    #[test]
    fn test_valid_response() {
        let result = response("AB-", 0.8123, 0.65).into_result().unwrap();
        assert_eq!(result.predicted_group, BloodGroup::AbNegative);
        assert!(result.allowed_to_donate);
        assert_eq!(result.model_accuracy.as_deref(), Some("99.5%"));
        assert!(!result.simulated);
    }

    #[test]
    fn test_unknown_label_rejected() {
        let err = response("Unknown", 0.0, 0.65).into_result().unwrap_err();
        assert!(matches!(err, PredictError::ServiceError(ref m) if m.contains("Unknown")));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        assert!(response("O+", 1.2, 0.65).into_result().is_err());
        assert!(response("O+", 0.7, -0.1).into_result().is_err());
        assert!(response("O+", f64::NAN, 0.65).into_result().is_err());
    }

    #[test]
    fn test_health_status() {
        let mut health: HealthStatus =
            serde_json::from_str(r#"{"status": "healthy", "model_loaded": true, "accuracy": "99.5%"}"#)
                .unwrap();
        health.http_status = 200;
        assert!(health.is_healthy());

        health.http_status = 500;
        assert!(!health.is_healthy());
    }

    #[test]
    fn test_timeout_secs_rounds_up() {
        assert_eq!(timeout_secs(Duration::from_secs(30)), 30);
        assert_eq!(timeout_secs(Duration::from_millis(250)), 1);
    }
}
