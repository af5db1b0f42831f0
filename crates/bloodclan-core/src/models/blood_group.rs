use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// ABO/Rh blood group as returned by the prediction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BloodGroup {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
}

use BloodGroup::*;

const O_NEGATIVE_RECIPIENTS: &[BloodGroup] = &[
    APositive, ANegative, BPositive, BNegative, AbPositive, AbNegative, OPositive, ONegative,
];
const O_POSITIVE_RECIPIENTS: &[BloodGroup] = &[APositive, BPositive, AbPositive, OPositive];
const A_NEGATIVE_RECIPIENTS: &[BloodGroup] = &[APositive, ANegative, AbPositive, AbNegative];
const A_POSITIVE_RECIPIENTS: &[BloodGroup] = &[APositive, AbPositive];
const B_NEGATIVE_RECIPIENTS: &[BloodGroup] = &[BPositive, BNegative, AbPositive, AbNegative];
const B_POSITIVE_RECIPIENTS: &[BloodGroup] = &[BPositive, AbPositive];
const AB_NEGATIVE_RECIPIENTS: &[BloodGroup] = &[AbPositive, AbNegative];
const AB_POSITIVE_RECIPIENTS: &[BloodGroup] = &[AbPositive];

impl BloodGroup {
    /// All eight groups, in the order the service documents them.
    pub const ALL: [BloodGroup; 8] = [
        APositive, ANegative, BPositive, BNegative, AbPositive, AbNegative, OPositive, ONegative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            APositive => "A+",
            ANegative => "A-",
            BPositive => "B+",
            BNegative => "B-",
            AbPositive => "AB+",
            AbNegative => "AB-",
            OPositive => "O+",
            ONegative => "O-",
        }
    }

    /// Groups that can safely receive a donation from this group.
    pub fn can_donate_to(self) -> &'static [BloodGroup] {
        match self {
            ONegative => O_NEGATIVE_RECIPIENTS,
            OPositive => O_POSITIVE_RECIPIENTS,
            ANegative => A_NEGATIVE_RECIPIENTS,
            APositive => A_POSITIVE_RECIPIENTS,
            BNegative => B_NEGATIVE_RECIPIENTS,
            BPositive => B_POSITIVE_RECIPIENTS,
            AbNegative => AB_NEGATIVE_RECIPIENTS,
            AbPositive => AB_POSITIVE_RECIPIENTS,
        }
    }

    /// Groups this group can receive from, derived from the donor table.
    pub fn can_receive_from(self) -> Vec<BloodGroup> {
        Self::ALL
            .iter()
            .copied()
            .filter(|donor| donor.can_donate_to().contains(&self))
            .collect()
    }

    pub fn can_donate_to_group(self, recipient: BloodGroup) -> bool {
        self.can_donate_to().contains(&recipient)
    }

    pub fn compatibility(self) -> CompatibilityEntry {
        CompatibilityEntry {
            group: self,
            can_donate_to: self.can_donate_to(),
            can_receive_from: self.can_receive_from(),
        }
    }

    /// Short human-readable summary of the donor side of the table.
    pub fn compatibility_note(self) -> String {
        match self {
            ONegative => "Universal donor - can help anyone!".to_string(),
            AbPositive => "Can receive from any blood group".to_string(),
            other => format!(
                "Compatible with {} blood type(s)",
                other.can_donate_to().len()
            ),
        }
    }
}

impl fmt::Display for BloodGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown blood group: {0}")]
pub struct UnknownBloodGroup(pub String);

impl FromStr for BloodGroup {
    type Err = UnknownBloodGroup;

    /// Accepts ASCII or U+2212 minus signs, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('\u{2212}', "-").to_uppercase();
        match normalized.as_str() {
            "A+" => Ok(APositive),
            "A-" => Ok(ANegative),
            "B+" => Ok(BPositive),
            "B-" => Ok(BNegative),
            "AB+" => Ok(AbPositive),
            "AB-" => Ok(AbNegative),
            "O+" => Ok(OPositive),
            "O-" => Ok(ONegative),
            _ => Err(UnknownBloodGroup(s.to_string())),
        }
    }
}

/// One row of the static compatibility table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompatibilityEntry {
    pub group: BloodGroup,
    pub can_donate_to: &'static [BloodGroup],
    pub can_receive_from: Vec<BloodGroup>,
}
