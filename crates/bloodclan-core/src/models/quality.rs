use serde::{Deserialize, Serialize};

/// Advisory quality snapshot computed locally before submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    pub width: u32,
    pub height: u32,
    /// Mean luma on the 0–255 scale.
    pub brightness: f64,
    /// Population standard deviation of luma.
    pub contrast: f64,
    pub aspect_ratio: f64,
    pub file_size: usize,
    pub is_good_quality: bool,
    /// Improvement suggestions in priority order; never empty.
    pub recommendations: Vec<String>,
}

impl QualityReport {
    /// The suggestion a compact UI shows first.
    pub fn primary_recommendation(&self) -> Option<&str> {
        self.recommendations.first().map(String::as_str)
    }
}
