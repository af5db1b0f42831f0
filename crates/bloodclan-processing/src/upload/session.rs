//! Upload session state
//!
//! One session per upload area. A session holds at most one current image;
//! its quality report and prediction result are tied to that image's
//! [`ImageId`] and vanish with it.

use bloodclan_core::{
    interpret, ImageId, Interpretation, PredictError, PredictionResult, QualityReport,
    UploadAreaId, UploadedImage,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("No image selected")]
    NoImage,

    #[error("A prediction is already in progress for this image")]
    PredictionInFlight,

    #[error("Unknown upload area: {0}")]
    UnknownArea(UploadAreaId),
}

/// Proof that a prediction was started for a specific image.
#[derive(Debug, Clone)]
pub struct PredictionTicket {
    pub image_id: ImageId,
    pub image: UploadedImage,
}

/// What happened to a completed prediction.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// The result belongs to the current image and is now displayed.
    Applied(Interpretation),
    /// The image was cleared or replaced while the call was in flight.
    Stale,
}

#[derive(Debug, Clone)]
struct CurrentImage {
    id: ImageId,
    image: UploadedImage,
    selected_at: DateTime<Utc>,
    quality: Option<QualityReport>,
    prediction: Option<PredictionResult>,
    interpretation: Option<Interpretation>,
    in_flight: bool,
    last_error: Option<PredictError>,
}

#[derive(Debug, Clone, Default)]
pub struct UploadSession {
    current: Option<CurrentImage>,
}

/// Serializable view of a session for display.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub image_id: ImageId,
    pub selected_at: DateTime<Utc>,
    pub content_type: String,
    pub byte_size: usize,
    pub prediction_in_flight: bool,
    pub quality: Option<QualityReport>,
    pub prediction: Option<PredictionResult>,
    pub interpretation: Option<Interpretation>,
    pub last_error: Option<String>,
}

impl UploadSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `image` current, discarding everything derived from the previous
    /// one. Returns the new image's id.
    pub fn select(&mut self, image: UploadedImage) -> ImageId {
        let id = ImageId::new();
        self.current = Some(CurrentImage {
            id,
            image,
            selected_at: Utc::now(),
            quality: None,
            prediction: None,
            interpretation: None,
            in_flight: false,
            last_error: None,
        });
        id
    }

    /// Drop the current image. Returns whether there was one.
    pub fn clear(&mut self) -> bool {
        self.current.take().is_some()
    }

    pub fn has_image(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_image_id(&self) -> Option<ImageId> {
        self.current.as_ref().map(|c| c.id)
    }

    pub fn image(&self) -> Option<&UploadedImage> {
        self.current.as_ref().map(|c| &c.image)
    }

    pub fn quality(&self) -> Option<&QualityReport> {
        self.current.as_ref().and_then(|c| c.quality.as_ref())
    }

    pub fn prediction(&self) -> Option<&PredictionResult> {
        self.current.as_ref().and_then(|c| c.prediction.as_ref())
    }

    pub fn interpretation(&self) -> Option<&Interpretation> {
        self.current.as_ref().and_then(|c| c.interpretation.as_ref())
    }

    pub fn last_error(&self) -> Option<&PredictError> {
        self.current.as_ref().and_then(|c| c.last_error.as_ref())
    }

    pub fn is_prediction_in_flight(&self) -> bool {
        self.current.as_ref().is_some_and(|c| c.in_flight)
    }

    /// Store a quality report computed for `image_id`. Returns false (and
    /// stores nothing) if that image is no longer current.
    pub fn record_quality(&mut self, image_id: ImageId, report: QualityReport) -> bool {
        match self.current.as_mut() {
            Some(current) if current.id == image_id => {
                current.quality = Some(report);
                true
            }
            _ => false,
        }
    }

    /// Mark the current image as having a prediction in flight.
    pub fn begin_prediction(&mut self) -> Result<PredictionTicket, SessionError> {
        let current = self.current.as_mut().ok_or(SessionError::NoImage)?;
        if current.in_flight {
            return Err(SessionError::PredictionInFlight);
        }
        current.in_flight = true;
        Ok(PredictionTicket {
            image_id: current.id,
            image: current.image.clone(),
        })
    }

    /// Release the in-flight mark for a call that will never complete.
    /// Returns false if `image_id` is no longer current or had no call running.
    pub fn abandon_prediction(&mut self, image_id: ImageId) -> bool {
        match self.current.as_mut() {
            Some(current) if current.id == image_id && current.in_flight => {
                current.in_flight = false;
                true
            }
            _ => false,
        }
    }

    /// Settle a prediction started with `ticket`.
    ///
    /// Responses for an image that is no longer current are discarded as
    /// [`PredictionOutcome::Stale`], whether they succeeded or failed. A failure
    /// for the current image keeps any earlier result in place.
    pub fn complete_prediction(
        &mut self,
        ticket: &PredictionTicket,
        response: Result<PredictionResult, PredictError>,
    ) -> Result<PredictionOutcome, PredictError> {
        let current = match self.current.as_mut() {
            Some(current) if current.id == ticket.image_id => current,
            _ => return Ok(PredictionOutcome::Stale),
        };

        current.in_flight = false;
        match response {
            Ok(result) => {
                let interpretation = interpret(&result);
                current.prediction = Some(result);
                current.interpretation = Some(interpretation.clone());
                current.last_error = None;
                Ok(PredictionOutcome::Applied(interpretation))
            }
            Err(err) => {
                current.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> Option<SessionSnapshot> {
        self.current.as_ref().map(|c| SessionSnapshot {
            image_id: c.id,
            selected_at: c.selected_at,
            content_type: c.image.content_type.clone(),
            byte_size: c.image.byte_size(),
            prediction_in_flight: c.in_flight,
            quality: c.quality.clone(),
            prediction: c.prediction.clone(),
            interpretation: c.interpretation.clone(),
            last_error: c.last_error.as_ref().map(|e| e.to_string()),
        })
    }
}
