//! Fingerprint pipeline: intake → quality → predict → interpret.
//!
//! One pipeline serves every upload area. Session state sits behind a
//! synchronous mutex that is only held between suspension points; the decode
//! and the network round trip both run with the lock released.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bloodclan_core::error::{ErrorMetadata, LogLevel};
use bloodclan_core::{
    ImageId, Interpretation, PredictError, Predictor, QualityReport, UploadAreaId, UploadedImage,
};

use super::session::{PredictionOutcome, SessionError, SessionSnapshot, UploadSession};
use super::traits::{DonorRegistration, NoOpDonorRegistration};
use crate::image::assess;
use crate::validator::{IntakeError, IntakePolicy};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Predict(#[from] PredictError),
}

impl ErrorMetadata for PipelineError {
    fn error_code(&self) -> &'static str {
        match self {
            PipelineError::Intake(e) => e.error_code(),
            PipelineError::Session(SessionError::NoImage) => "NO_IMAGE",
            PipelineError::Session(SessionError::PredictionInFlight) => "PREDICTION_IN_FLIGHT",
            PipelineError::Session(SessionError::UnknownArea(_)) => "UNKNOWN_UPLOAD_AREA",
            PipelineError::Predict(e) => e.error_code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            PipelineError::Intake(e) => e.is_recoverable(),
            PipelineError::Session(SessionError::PredictionInFlight) => true,
            PipelineError::Session(_) => false,
            PipelineError::Predict(e) => e.is_recoverable(),
        }
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            PipelineError::Intake(e) => e.suggested_action(),
            PipelineError::Session(SessionError::PredictionInFlight) => {
                Some("Wait for the current analysis to finish")
            }
            PipelineError::Session(_) => Some("Select a fingerprint image"),
            PipelineError::Predict(e) => e.suggested_action(),
        }
    }

    fn client_message(&self) -> String {
        match self {
            PipelineError::Intake(e) => e.client_message(),
            PipelineError::Session(SessionError::PredictionInFlight) => {
                "Analysis already in progress".to_string()
            }
            PipelineError::Session(_) => "Please select a fingerprint image first".to_string(),
            PipelineError::Predict(e) => e.client_message(),
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            PipelineError::Intake(e) => e.log_level(),
            PipelineError::Session(_) => LogLevel::Debug,
            PipelineError::Predict(e) => e.log_level(),
        }
    }
}

fn log_predict_error(area: &UploadAreaId, image_id: ImageId, error: &PredictError) {
    let code = error.error_code();
    match error.log_level() {
        LogLevel::Debug => {
            tracing::debug!(area = %area, image_id = %image_id, error = %error, code, "Prediction failed");
        }
        LogLevel::Warn => {
            tracing::warn!(area = %area, image_id = %image_id, error = %error, code, "Prediction failed");
        }
        LogLevel::Error => {
            tracing::error!(area = %area, image_id = %image_id, error = %error, code, "Prediction failed");
        }
    }
}

/// Clears the in-flight mark if a prediction future is dropped before the
/// predictor answers.
struct InFlightGuard<'a> {
    pipeline: &'a FingerprintPipeline,
    area: &'a UploadAreaId,
    image_id: ImageId,
    armed: bool,
}

impl InFlightGuard<'_> {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let released = self
            .pipeline
            .sessions()
            .get_mut(self.area)
            .map(|session| session.abandon_prediction(self.image_id))
            .unwrap_or(false);
        if released {
            tracing::debug!(area = %self.area, image_id = %self.image_id, "Prediction abandoned before completion");
        }
    }
}

pub struct FingerprintPipeline {
    policy: IntakePolicy,
    predictor: Arc<dyn Predictor>,
    registration: Arc<dyn DonorRegistration>,
    sessions: Mutex<HashMap<UploadAreaId, UploadSession>>,
}

impl FingerprintPipeline {
    pub fn new(policy: IntakePolicy, predictor: Arc<dyn Predictor>) -> Self {
        Self {
            policy,
            predictor,
            registration: Arc::new(NoOpDonorRegistration),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_registration(mut self, registration: Arc<dyn DonorRegistration>) -> Self {
        self.registration = registration;
        self
    }

    pub fn policy(&self) -> &IntakePolicy {
        &self.policy
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<UploadAreaId, UploadSession>> {
        // Session state stays consistent across a panic in a registration callback.
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Validate a selection and make it the area's current image.
    ///
    /// On rejection the area keeps whatever it had before and the rejected
    /// file is dropped.
    pub fn select(
        &self,
        area: &UploadAreaId,
        file: Option<UploadedImage>,
    ) -> Result<ImageId, PipelineError> {
        if let Err(err) = self.policy.validate(file.as_ref()) {
            tracing::debug!(area = %area, error = %err, "File rejected at intake");
            return Err(err.into());
        }
        let image = file.ok_or(IntakeError::Missing)?;
        let byte_size = image.byte_size();

        let mut sessions = self.sessions();
        let session = sessions.entry(area.clone()).or_default();
        let replaced = session.has_image();
        let image_id = session.select(image);
        if replaced {
            self.registration.lock();
        }

        tracing::info!(
            area = %area,
            image_id = %image_id,
            byte_size,
            replaced,
            "Fingerprint image selected"
        );
        Ok(image_id)
    }

    /// Remove the area's image together with its report and result.
    pub fn clear(&self, area: &UploadAreaId) {
        let mut sessions = self.sessions();
        let cleared = sessions
            .get_mut(area)
            .map(UploadSession::clear)
            .unwrap_or(false);
        self.registration.lock();

        if cleared {
            tracing::info!(area = %area, "Upload area cleared");
        }
    }

    /// Compute the advisory quality report for the area's current image.
    ///
    /// Returns `Ok(None)` when the image cannot be decoded or was replaced
    /// before the report was ready; neither blocks prediction.
    pub async fn assess(&self, area: &UploadAreaId) -> Result<Option<QualityReport>, PipelineError> {
        let (image_id, image) = {
            let sessions = self.sessions();
            let session = sessions
                .get(area)
                .ok_or_else(|| SessionError::UnknownArea(area.clone()))?;
            match (session.current_image_id(), session.image()) {
                (Some(id), Some(image)) => (id, image.clone()),
                _ => return Err(SessionError::NoImage.into()),
            }
        };

        let report = match assess(&image).await {
            Ok(report) => report,
            Err(err) => {
                tracing::warn!(area = %area, image_id = %image_id, error = %err, "Quality assessment unavailable");
                return Ok(None);
            }
        };

        let mut sessions = self.sessions();
        let recorded = sessions
            .get_mut(area)
            .map(|session| session.record_quality(image_id, report.clone()))
            .unwrap_or(false);

        if !recorded {
            tracing::debug!(area = %area, image_id = %image_id, "Discarding stale quality report");
            return Ok(None);
        }
        Ok(Some(report))
    }

    /// Submit the area's current image for prediction and apply the result.
    pub async fn predict(&self, area: &UploadAreaId) -> Result<PredictionOutcome, PipelineError> {
        let ticket = {
            let mut sessions = self.sessions();
            let session = sessions
                .get_mut(area)
                .ok_or_else(|| SessionError::UnknownArea(area.clone()))?;
            session.begin_prediction()?
        };

        let guard = InFlightGuard {
            pipeline: self,
            area,
            image_id: ticket.image_id,
            armed: true,
        };

        tracing::info!(area = %area, image_id = %ticket.image_id, "Submitting fingerprint for prediction");
        let response = self.predictor.predict(&ticket.image).await;
        // Must happen before the session lock below; the guard takes it too.
        guard.disarm();

        let mut sessions = self.sessions();
        let Some(session) = sessions.get_mut(area) else {
            return Ok(PredictionOutcome::Stale);
        };

        match session.complete_prediction(&ticket, response) {
            Ok(PredictionOutcome::Applied(interpretation)) => {
                match interpretation.donor_prefill() {
                    Some(prefill) => self.registration.unlock(prefill),
                    None => self.registration.lock(),
                }
                tracing::info!(
                    area = %area,
                    image_id = %ticket.image_id,
                    group = %interpretation.predicted_group,
                    confidence = interpretation.confidence,
                    eligible = interpretation.eligible,
                    simulated = interpretation.simulated,
                    "Prediction applied"
                );
                Ok(PredictionOutcome::Applied(interpretation))
            }
            Ok(PredictionOutcome::Stale) => {
                tracing::debug!(area = %area, image_id = %ticket.image_id, "Discarding stale prediction response");
                Ok(PredictionOutcome::Stale)
            }
            Err(err) => {
                log_predict_error(area, ticket.image_id, &err);
                Err(err.into())
            }
        }
    }

    /// Resubmit the stored file after a failure. Same rules as [`predict`](Self::predict).
    pub async fn retry(&self, area: &UploadAreaId) -> Result<PredictionOutcome, PipelineError> {
        tracing::info!(area = %area, "Retrying prediction");
        self.predict(area).await
    }

    pub fn current_interpretation(&self, area: &UploadAreaId) -> Option<Interpretation> {
        self.sessions()
            .get(area)
            .and_then(|session| session.interpretation().cloned())
    }

    pub fn quality(&self, area: &UploadAreaId) -> Option<QualityReport> {
        self.sessions()
            .get(area)
            .and_then(|session| session.quality().cloned())
    }

    pub fn snapshot(&self, area: &UploadAreaId) -> Option<SessionSnapshot> {
        self.sessions()
            .get(area)
            .and_then(UploadSession::snapshot)
    }
}
