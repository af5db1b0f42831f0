//! Error types module
//!
//! Transport failures of the remote prediction call are unified under
//! [`PredictError`]. Errors self-describe how they should be presented through
//! the [`ErrorMetadata`] trait so every front end renders them the same way.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like validation failures
    Debug,
    /// Warning level - for recoverable issues like timeouts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be presented to the user
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "PREDICTION_TIMEOUT")
    fn error_code(&self) -> &'static str;

    /// Whether a manual retry with the same file can succeed
    fn is_recoverable(&self) -> bool;

    /// Suggested action for the user
    fn suggested_action(&self) -> Option<&'static str>;

    /// User-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

/// Failure of the remote prediction call. None of these are retried
/// automatically.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PredictError {
    #[error("Prediction request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Network unavailable: {0}")]
    NetworkUnavailable(String),

    #[error("Prediction service error: {0}")]
    ServiceError(String),

    #[error("Unknown prediction failure: {0}")]
    Unknown(String),
}

/// Static metadata for each variant: (error_code, recoverable, suggested_action, log_level).
fn predict_error_static_metadata(
    err: &PredictError,
) -> (&'static str, bool, Option<&'static str>, LogLevel) {
    match err {
        PredictError::Timeout { .. } => (
            "PREDICTION_TIMEOUT",
            true,
            Some("Try again with a smaller image"),
            LogLevel::Warn,
        ),
        PredictError::PayloadTooLarge(_) => (
            "PAYLOAD_TOO_LARGE",
            false,
            Some("Reduce file size and try again"),
            LogLevel::Debug,
        ),
        PredictError::NetworkUnavailable(_) => (
            "NETWORK_UNAVAILABLE",
            true,
            Some("Check your connection and try again"),
            LogLevel::Warn,
        ),
        PredictError::ServiceError(_) => (
            "SERVICE_ERROR",
            true,
            Some("Try again with a different image"),
            LogLevel::Error,
        ),
        PredictError::Unknown(_) => (
            "UNKNOWN_ERROR",
            true,
            Some("Try again"),
            LogLevel::Error,
        ),
    }
}

impl PredictError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PredictError::Timeout { .. })
    }
}

impl ErrorMetadata for PredictError {
    fn error_code(&self) -> &'static str {
        predict_error_static_metadata(self).0
    }

    fn is_recoverable(&self) -> bool {
        predict_error_static_metadata(self).1
    }

    fn suggested_action(&self) -> Option<&'static str> {
        predict_error_static_metadata(self).2
    }

    fn log_level(&self) -> LogLevel {
        predict_error_static_metadata(self).3
    }

    fn client_message(&self) -> String {
        match self {
            PredictError::Timeout { .. } => {
                "Analysis timed out. Please try with a smaller image.".to_string()
            }
            PredictError::PayloadTooLarge(_) => {
                "Image file is too large for the prediction service. Please use a smaller image."
                    .to_string()
            }
            PredictError::NetworkUnavailable(_) => {
                "Network error. Please check your connection and try again.".to_string()
            }
            PredictError::ServiceError(ref msg) => msg.clone(),
            PredictError::Unknown(_) => {
                "Error analyzing fingerprint. Please try again.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_metadata_timeout() {
        let err = PredictError::Timeout { timeout_secs: 30 };
        assert!(err.is_timeout());
        assert_eq!(err.error_code(), "PREDICTION_TIMEOUT");
        assert!(err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Warn);
        assert!(err.to_string().contains("30s"));
        assert!(err.client_message().contains("timed out"));
    }

    #[test]
    fn test_error_metadata_payload_too_large() {
        let err = PredictError::PayloadTooLarge("413".to_string());
        assert_eq!(err.error_code(), "PAYLOAD_TOO_LARGE");
        assert!(!err.is_recoverable());
        assert_eq!(err.log_level(), LogLevel::Debug);
    }

    #[test]
    fn test_service_error_passes_message_through() {
        let err = PredictError::ServiceError("Invalid file type. Please upload an image.".into());
        assert_eq!(
            err.client_message(),
            "Invalid file type. Please upload an image."
        );
        assert_eq!(err.log_level(), LogLevel::Error);
    }

    #[test]
    fn test_error_metadata_suggested_actions() {
        assert_eq!(
            PredictError::NetworkUnavailable("refused".into()).suggested_action(),
            Some("Check your connection and try again")
        );
        assert_eq!(
            PredictError::Unknown("?".into()).client_message(),
            "Error analyzing fingerprint. Please try again."
        );
    }
}
