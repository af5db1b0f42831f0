//! Image module
//!
//! Decoding of selected files into pixel data (processor) and the advisory
//! quality heuristics computed from it (quality).

pub mod processor;
pub mod quality;

pub use processor::{decode_rgba, QualityError};
pub use quality::{assess, assess_bytes, is_good_quality, quality_recommendations, LumaStats};
