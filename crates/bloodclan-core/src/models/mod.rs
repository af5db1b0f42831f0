//! Data models for the fingerprint pipeline
//!
//! Each sub-module covers one piece of the upload session: the uploaded file,
//! the advisory quality snapshot, the remote prediction and the static
//! blood compatibility table.

mod blood_group;
mod prediction;
mod quality;
mod upload;

// Re-export all models for convenient imports
pub use blood_group::*;
pub use prediction::*;
pub use quality::*;
pub use upload::*;
