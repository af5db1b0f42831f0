//! Collaborator seams for the upload pipeline

use bloodclan_core::DonorPrefill;

/// Donor-registration form driven by prediction results.
///
/// Calls are made while the pipeline holds its session lock, so they arrive in
/// the same order as the state transitions that caused them. Implementations
/// must return quickly and must not call back into the pipeline.
pub trait DonorRegistration: Send + Sync {
    /// Enable registration, pre-filled with the predicted group
    fn unlock(&self, prefill: &DonorPrefill);

    /// Disable registration and discard any pre-filled values
    fn lock(&self);
}

/// No-op implementation for front ends without a registration form
pub struct NoOpDonorRegistration;

impl DonorRegistration for NoOpDonorRegistration {
    fn unlock(&self, _prefill: &DonorPrefill) {}

    fn lock(&self) {}
}
