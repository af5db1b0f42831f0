use bloodclan_core::error::{ErrorMetadata, LogLevel};
use bloodclan_core::{UploadPolicyKind, UploadedImage};
use std::path::Path;

const MIB: usize = 1024 * 1024;

/// Media types a fingerprint photo may be declared as. `image/jpg` is a
/// non-standard alias some browsers and tools still emit.
pub const ACCEPTED_CONTENT_TYPES: [&str; 6] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/bmp",
    "image/tiff",
];

/// Rejection reasons for a selected fingerprint file
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    #[error("No file selected")]
    Missing,

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    TooLarge { size: usize, max: usize },

    #[error("File too small: {size} bytes (min: {min} bytes)")]
    TooSmall { size: usize, min: usize },
}

impl ErrorMetadata for IntakeError {
    fn error_code(&self) -> &'static str {
        match self {
            IntakeError::Missing => "FILE_MISSING",
            IntakeError::InvalidType { .. } => "INVALID_FILE_TYPE",
            IntakeError::TooLarge { .. } => "FILE_TOO_LARGE",
            IntakeError::TooSmall { .. } => "FILE_TOO_SMALL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn suggested_action(&self) -> Option<&'static str> {
        match self {
            IntakeError::Missing => Some("Select a fingerprint image"),
            IntakeError::InvalidType { .. } => Some("Use a JPEG, PNG, GIF, BMP or TIFF image"),
            IntakeError::TooLarge { .. } => Some("Reduce file size and try again"),
            IntakeError::TooSmall { .. } => Some("Select a proper image file"),
        }
    }

    fn client_message(&self) -> String {
        match self {
            IntakeError::Missing => "Please select a fingerprint image first".to_string(),
            IntakeError::InvalidType { .. } => {
                "Please select a valid image file (JPEG, PNG, GIF, BMP, TIFF)".to_string()
            }
            IntakeError::TooLarge { max, .. } => {
                format!("File size must be less than {}MB", max / MIB)
            }
            IntakeError::TooSmall { .. } => {
                "File is too small. Please select a proper image file".to_string()
            }
        }
    }

    fn log_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

/// Size and type bounds applied to every selected file.
#[derive(Debug, Clone, PartialEq)]
pub struct IntakePolicy {
    max_file_size: usize,
    min_file_size: Option<usize>,
    allowed_content_types: Vec<String>,
}

impl IntakePolicy {
    pub fn new(
        max_file_size: usize,
        min_file_size: Option<usize>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            min_file_size,
            allowed_content_types: allowed_content_types
                .into_iter()
                .map(|ct| ct.to_lowercase())
                .collect(),
        }
    }

    /// 16 MiB maximum, 1 KiB minimum.
    pub fn primary() -> Self {
        Self::new(16 * MIB, Some(1024), accepted_content_types())
    }

    /// 5 MiB maximum, no minimum.
    pub fn secondary() -> Self {
        Self::new(5 * MIB, None, accepted_content_types())
    }

    pub fn for_kind(kind: UploadPolicyKind) -> Self {
        match kind {
            UploadPolicyKind::Primary => Self::primary(),
            UploadPolicyKind::Secondary => Self::secondary(),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    pub fn min_file_size(&self) -> Option<usize> {
        self.min_file_size
    }

    /// Validate content type (case-insensitive)
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), IntakeError> {
        let normalized = content_type.trim().to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(IntakeError::InvalidType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Validate size bounds
    pub fn validate_file_size(&self, size: usize) -> Result<(), IntakeError> {
        if size > self.max_file_size {
            return Err(IntakeError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }

        if let Some(min) = self.min_file_size {
            if size < min {
                return Err(IntakeError::TooSmall { size, min });
            }
        }

        Ok(())
    }

    /// Run every check in order: presence, type, upper bound, lower bound.
    pub fn validate(&self, file: Option<&UploadedImage>) -> Result<(), IntakeError> {
        let file = file.ok_or(IntakeError::Missing)?;
        self.validate_content_type(&file.content_type)?;
        self.validate_file_size(file.byte_size())?;
        Ok(())
    }
}

impl Default for IntakePolicy {
    fn default() -> Self {
        Self::primary()
    }
}

fn accepted_content_types() -> Vec<String> {
    ACCEPTED_CONTENT_TYPES
        .iter()
        .map(|ct| ct.to_string())
        .collect()
}

/// Declared media type for a file on disk, derived from its extension.
pub fn content_type_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match extension.as_deref() {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("bmp") => "image/bmp",
        Some("tif") | Some("tiff") => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// Read a file into an [`UploadedImage`]. No validation happens here.
pub async fn load_image_file(path: &Path) -> std::io::Result<UploadedImage> {
    let data = tokio::fs::read(path).await?;
    let mut image = UploadedImage::new(data, content_type_for_path(path));
    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        image = image.with_file_name(name);
    }
    Ok(image)
}
