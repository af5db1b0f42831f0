//! Upload module
//!
//! Per-area upload sessions and the pipeline that validates, assesses and
//! predicts on them.

pub mod pipeline;
pub mod session;
pub mod traits;

pub use pipeline::{FingerprintPipeline, PipelineError};
pub use session::{
    PredictionOutcome, PredictionTicket, SessionError, SessionSnapshot, UploadSession,
};
pub use traits::{DonorRegistration, NoOpDonorRegistration};
