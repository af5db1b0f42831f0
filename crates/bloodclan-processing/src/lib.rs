//! BloodClan Processing Library
//!
//! File intake, local quality assessment and the per-area upload pipeline that
//! drives a [`Predictor`](bloodclan_core::Predictor) and interprets its results.

pub mod image;
pub mod upload;
pub mod validator;

pub use crate::image::{assess, assess_bytes, QualityError};
pub use crate::upload::{
    DonorRegistration, FingerprintPipeline, NoOpDonorRegistration, PipelineError,
    PredictionOutcome, PredictionTicket, SessionError, SessionSnapshot, UploadSession,
};
pub use crate::validator::{content_type_for_path, load_image_file, IntakeError, IntakePolicy};
