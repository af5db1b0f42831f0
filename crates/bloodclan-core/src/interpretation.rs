//! Result interpretation
//!
//! Turns a [`PredictionResult`] into what the user sees: eligibility, the
//! confidence tier, compatible groups and either an eligibility notice or a
//! structured low-confidence message.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{BloodGroup, ConfidenceTier, PredictionResult};

/// Fixed advice shown whenever a prediction is not eligible.
pub const IMPROVEMENT_TIPS: [&str; 4] = [
    "Taking a clearer fingerprint image",
    "Ensuring good lighting and focus",
    "Using a higher resolution camera",
    "Getting professional medical blood typing",
];

/// Payload handed to the donor-registration form when it unlocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DonorPrefill {
    pub predicted_blood_group: BloodGroup,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LowConfidenceMessage {
    pub confidence: f64,
    pub threshold: f64,
    pub tips: Vec<&'static str>,
}

impl fmt::Display for LowConfidenceMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The AI confidence level ({:.1}%) is below our safety threshold of {:.0}% ({}) for donation matching.",
            self.confidence * 100.0,
            self.threshold * 100.0,
            self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InterpretationMessage {
    Eligible { prefill: DonorPrefill },
    LowConfidence(LowConfidenceMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interpretation {
    pub predicted_group: BloodGroup,
    pub confidence: f64,
    pub threshold: f64,
    pub eligible: bool,
    pub confidence_tier: ConfidenceTier,
    pub compatible_recipients: Vec<BloodGroup>,
    pub compatible_donors: Vec<BloodGroup>,
    pub compatibility_note: String,
    pub simulated: bool,
    pub message: InterpretationMessage,
}

impl Interpretation {
    /// Present only when the service allowed donation.
    pub fn donor_prefill(&self) -> Option<&DonorPrefill> {
        match &self.message {
            InterpretationMessage::Eligible { prefill } => Some(prefill),
            InterpretationMessage::LowConfidence(_) => None,
        }
    }

    pub fn low_confidence(&self) -> Option<&LowConfidenceMessage> {
        match &self.message {
            InterpretationMessage::LowConfidence(message) => Some(message),
            InterpretationMessage::Eligible { .. } => None,
        }
    }
}

/// Interpret a validated prediction. Eligibility follows `allowed_to_donate`
/// verbatim; the tier is banded independently of it.
pub fn interpret(result: &PredictionResult) -> Interpretation {
    let group = result.predicted_group;
    let eligible = result.allowed_to_donate;

    let message = if eligible {
        InterpretationMessage::Eligible {
            prefill: DonorPrefill {
                predicted_blood_group: group,
                confidence: result.confidence,
            },
        }
    } else {
        InterpretationMessage::LowConfidence(LowConfidenceMessage {
            confidence: result.confidence,
            threshold: result.threshold,
            tips: IMPROVEMENT_TIPS.to_vec(),
        })
    };

    Interpretation {
        predicted_group: group,
        confidence: result.confidence,
        threshold: result.threshold,
        eligible,
        confidence_tier: result.confidence_tier(),
        compatible_recipients: group.can_donate_to().to_vec(),
        compatible_donors: group.can_receive_from(),
        compatibility_note: group.compatibility_note(),
        simulated: result.simulated,
        message,
    }
}
