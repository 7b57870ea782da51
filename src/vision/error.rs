//! Error types for the recognition pipeline

use thiserror::Error;

/// Errors raised while turning an image into recognized text
#[derive(Debug, Error)]
pub enum VisionError {
    /// The source could not be turned into a processable raster
    #[error("image decode failed: {0}")]
    ImageDecode(String),

    /// A single patch failed to recognize; the pipeline tolerates these
    #[error("recognition failed for patch {index}: {reason}")]
    PatchRecognition { index: usize, reason: String },

    /// The recognition backend could not be created or invoked
    #[error("recognition backend error: {0}")]
    Backend(String),

    /// The language tag is not one of the supported recognition languages
    #[error("unsupported recognition language: {0}")]
    UnsupportedLanguage(String),

    /// A recognition pass is already running on this pipeline
    #[error("a recognition pass is already in progress")]
    Busy,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<image::ImageError> for VisionError {
    fn from(err: image::ImageError) -> Self {
        VisionError::ImageDecode(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VisionError>;
