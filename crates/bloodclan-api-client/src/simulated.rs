//! Degraded-mode predictor
//!
//! Produces a random classification without contacting the service. Only
//! wired in when the operator opts in and the health probe has failed; every
//! result it returns is marked `simulated`.

use async_trait::async_trait;
use bloodclan_core::{BloodGroup, PredictError, PredictionResult, Predictor, UploadedImage};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

const MIN_CONFIDENCE: f64 = 0.70;
const MAX_CONFIDENCE: f64 = 1.00;

pub struct SimulatedPredictor {
    threshold: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedPredictor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Deterministic sequence for tests.
    pub fn with_seed(threshold: f64, seed: u64) -> Self {
        Self {
            threshold,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    fn draw(&self) -> (BloodGroup, f64) {
        let mut rng = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let group = BloodGroup::ALL[rng.random_range(0..BloodGroup::ALL.len())];
        let confidence = rng.random_range(MIN_CONFIDENCE..MAX_CONFIDENCE);
        (group, (confidence * 10_000.0).round() / 10_000.0)
    }
}

#[async_trait]
impl Predictor for SimulatedPredictor {
    async fn predict(&self, image: &UploadedImage) -> Result<PredictionResult, PredictError> {
        let (group, confidence) = self.draw();

        tracing::warn!(
            group = %group,
            confidence,
            byte_size = image.byte_size(),
            "Returning simulated prediction; the model service is unavailable"
        );

        Ok(PredictionResult {
            predicted_group: group,
            confidence,
            allowed_to_donate: confidence >= self.threshold,
            threshold: self.threshold,
            model_accuracy: None,
            message: Some(format!(
                "Simulated prediction: {} with {:.2}% confidence",
                group,
                confidence * 100.0
            )),
            simulated: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image() -> UploadedImage {
        UploadedImage::new(vec![0u8; 2048], "image/png")
    }

    #[tokio::test]
    async fn test_simulated_results_stay_in_range() {
        let predictor = SimulatedPredictor::with_seed(0.65, 7);
        for _ in 0..50 {
            let result = predictor.predict(&image()).await.unwrap();
            assert!(result.simulated);
            assert!((0.70..=1.0).contains(&result.confidence));
            assert_eq!(result.allowed_to_donate, result.confidence >= 0.65);
            assert_eq!(result.threshold, 0.65);
        }
    }

    #[tokio::test]
    async fn test_eligibility_uses_configured_threshold() {
        let predictor = SimulatedPredictor::with_seed(0.9, 3);
        for _ in 0..20 {
            let result = predictor.predict(&image()).await.unwrap();
            assert_eq!(result.allowed_to_donate, result.confidence >= 0.9);
        }
    }

    #[tokio::test]
    async fn test_seeded_sequence_is_reproducible() {
        let a = SimulatedPredictor::with_seed(0.65, 42);
        let b = SimulatedPredictor::with_seed(0.65, 42);
        for _ in 0..5 {
            assert_eq!(
                a.predict(&image()).await.unwrap(),
                b.predict(&image()).await.unwrap()
            );
        }
    }
}
