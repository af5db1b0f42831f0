use serde::{Deserialize, Serialize};
use std::fmt;

use super::BloodGroup;

const HIGH_CONFIDENCE: f64 = 0.80;
const MEDIUM_CONFIDENCE: f64 = 0.65;

/// Validated response from the remote blood-group classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub predicted_group: BloodGroup,
    /// In [0, 1].
    pub confidence: f64,
    /// The service's own threshold comparison; never recomputed client-side.
    pub allowed_to_donate: bool,
    /// In [0, 1]. Kept for display only.
    pub threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_accuracy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Set when the result came from the degraded-mode simulator.
    #[serde(default)]
    pub simulated: bool,
}

impl PredictionResult {
    pub fn confidence_percentage(&self) -> f64 {
        self.confidence * 100.0
    }

    pub fn confidence_tier(&self) -> ConfidenceTier {
        ConfidenceTier::from_confidence(self.confidence)
    }
}

/// Presentational banding of a confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            ConfidenceTier::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_cutoffs() {
        assert_eq!(ConfidenceTier::from_confidence(1.0), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.80), ConfidenceTier::High);
        assert_eq!(ConfidenceTier::from_confidence(0.7999), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.65), ConfidenceTier::Medium);
        assert_eq!(ConfidenceTier::from_confidence(0.6499), ConfidenceTier::Low);
        assert_eq!(ConfidenceTier::from_confidence(0.0), ConfidenceTier::Low);
    }

    #[test]
    fn test_tier_is_monotonic_over_unit_interval() {
        let mut previous = ConfidenceTier::Low;
        for step in 0..=100 {
            let tier = ConfidenceTier::from_confidence(step as f64 / 100.0);
            let rank = |t: ConfidenceTier| match t {
                ConfidenceTier::Low => 0,
                ConfidenceTier::Medium => 1,
                ConfidenceTier::High => 2,
            };
            assert!(rank(tier) >= rank(previous));
            previous = tier;
        }
    }

    #[test]
    fn test_prediction_result_deserializes_without_optional_fields() {
        let json = r#"{
            "predicted_group": "B+",
            "confidence": 0.91,
            "allowed_to_donate": true,
            "threshold": 0.65
        }"#;
        let result: PredictionResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.predicted_group, BloodGroup::BPositive);
        assert!(!result.simulated);
        assert!(result.model_accuracy.is_none());
        assert_eq!(result.confidence_tier(), ConfidenceTier::High);
    }
}
