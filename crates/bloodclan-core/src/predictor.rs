use async_trait::async_trait;

use crate::error::PredictError;
use crate::models::{PredictionResult, UploadedImage};

/// Remote (or simulated) blood-group classifier.
///
/// One call is one outbound request; implementations never retry on their own.
#[async_trait]
pub trait Predictor: Send + Sync {
    async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, PredictError>;
}
