//! Image decoding

use image::{ImageReader, RgbaImage};
use std::io::Cursor;

/// Failure to turn a selected file into pixel data
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum QualityError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Quality worker failed: {0}")]
    Worker(String),
}

/// Decode image bytes into an RGBA pixel grid. The format is sniffed from the
/// content, not taken from the declared media type.
pub fn decode_rgba(data: &[u8]) -> Result<RgbaImage, QualityError> {
    let reader = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .map_err(|e| QualityError::Decode(e.to_string()))?;

    if reader.format().is_none() {
        return Err(QualityError::Decode("unrecognized image format".to_string()));
    }

    let img = reader
        .decode()
        .map_err(|e| QualityError::Decode(e.to_string()))?;

    Ok(img.to_rgba8())
}
