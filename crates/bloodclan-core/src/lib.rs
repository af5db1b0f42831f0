//! BloodClan Core Library
//!
//! This crate provides the domain models, result interpretation, error types and
//! configuration shared by every stage of the fingerprint prediction pipeline.

pub mod config;
pub mod error;
pub mod interpretation;
pub mod models;
pub mod predictor;

// Re-export commonly used types
pub use config::{PipelineConfig, UploadPolicyKind};
pub use error::{ErrorMetadata, LogLevel, PredictError};
pub use interpretation::{
    interpret, DonorPrefill, Interpretation, InterpretationMessage, LowConfidenceMessage,
};
pub use models::{
    BloodGroup, CompatibilityEntry, ConfidenceTier, ImageId, PredictionResult, QualityReport,
    UploadAreaId, UploadedImage,
};
pub use predictor::Predictor;
