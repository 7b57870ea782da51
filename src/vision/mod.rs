//! Vision/OCR Layer
//!
//! Turns an upright photo into recognized text. The image is cut into
//! overlapping horizontal patches, each patch is handed to a recognition
//! backend, and the per-patch observations are merged back into one result.
//! Supports multiple OCR backends:
//! - Tesseract CLI (all platforms)
//! - Windows OCR API (Windows only)

pub mod error;
pub mod input;
pub mod language;
pub mod merge;
pub mod observation;
pub mod patch;
pub mod pipeline;
pub mod tesseract;
#[cfg(windows)]
pub mod windows_ocr;

pub use error::{Result, VisionError};
pub use input::{decode_image, load_image};
pub use language::RecognitionLanguage;
pub use merge::{MergedResult, PatchOutcome};
pub use observation::{Candidate, NormalizedRect, Observation};
pub use patch::{Patch, PatchLayout, PatchSlicer, DEFAULT_DIVISION_COUNT};
pub use pipeline::RecognitionPipeline;
pub use tesseract::TesseractOcr;
#[cfg(windows)]
pub use windows_ocr::WindowsOcr;

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::config::{RecognitionSettings, TesseractSettings};

/// OCR backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum OcrBackend {
    /// Tesseract command line tool
    Tesseract,
    /// Windows built-in OCR
    WindowsOcr,
}

impl Default for OcrBackend {
    fn default() -> Self {
        if cfg!(windows) {
            OcrBackend::WindowsOcr
        } else {
            OcrBackend::Tesseract
        }
    }
}

/// Recognition effort
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecognitionLevel {
    /// Highest accuracy the backend offers
    #[default]
    Accurate,
    /// Trade accuracy for speed
    Fast,
}

/// Parameters of one recognition request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionRequest {
    /// Language hint
    pub language: RecognitionLanguage,
    /// Accuracy mode
    pub level: RecognitionLevel,
    /// Let the backend correct words against its language model
    pub uses_language_correction: bool,
}

impl RecognitionRequest {
    /// Highest-accuracy request with language correction
    pub fn accurate(language: RecognitionLanguage) -> Self {
        Self {
            language,
            level: RecognitionLevel::Accurate,
            uses_language_correction: true,
        }
    }
}

impl Default for RecognitionRequest {
    fn default() -> Self {
        Self::accurate(RecognitionLanguage::default())
    }
}

/// A text recognition engine
///
/// Given one image and a request, returns observations whose bounds are
/// normalized to that image with a bottom-left origin. Implementations
/// block; the pipeline runs them on the blocking worker pool.
pub trait TextRecognizer: Send + Sync {
    /// Human-readable name for logs
    fn name(&self) -> &str;

    /// Recognize the text in `image`
    fn recognize(&self, image: &RgbaImage, request: &RecognitionRequest) -> Result<Vec<Observation>>;
}

/// Create the recognizer for a backend
pub fn create_recognizer(
    backend: OcrBackend,
    tesseract: &TesseractSettings,
) -> Result<Arc<dyn TextRecognizer>> {
    info!("Initializing {:?} backend", backend);
    match backend {
        OcrBackend::Tesseract => Ok(Arc::new(TesseractOcr::new(tesseract))),
        #[cfg(windows)]
        OcrBackend::WindowsOcr => Ok(Arc::new(WindowsOcr::new())),
        #[cfg(not(windows))]
        OcrBackend::WindowsOcr => Err(VisionError::Backend(
            "Windows OCR is only available on Windows".into(),
        )),
    }
}

/// Languages the backend has installed, as the backend names them
pub fn installed_languages(backend: OcrBackend, tesseract: &TesseractSettings) -> Result<Vec<String>> {
    match backend {
        OcrBackend::Tesseract => TesseractOcr::new(tesseract).available_languages(),
        #[cfg(windows)]
        OcrBackend::WindowsOcr => WindowsOcr::available_languages(),
        #[cfg(not(windows))]
        OcrBackend::WindowsOcr => Err(VisionError::Backend(
            "Windows OCR is only available on Windows".into(),
        )),
    }
}

/// Build a pipeline from settings, creating the configured backend
pub fn pipeline_from_settings(
    settings: &RecognitionSettings,
    tesseract: &TesseractSettings,
) -> Result<RecognitionPipeline> {
    let recognizer = create_recognizer(settings.backend, tesseract)?;
    Ok(RecognitionPipeline::with_settings(recognizer, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_request_is_accurate_with_correction() {
        let request = RecognitionRequest::default();
        assert_eq!(request.language, RecognitionLanguage::English);
        assert_eq!(request.level, RecognitionLevel::Accurate);
        assert!(request.uses_language_correction);
    }

    #[test]
    fn test_backend_serde_names() {
        assert_eq!(serde_json::to_string(&OcrBackend::WindowsOcr).unwrap(), "\"windows_ocr\"");
        assert_eq!(serde_json::to_string(&OcrBackend::Tesseract).unwrap(), "\"tesseract\"");
    }

    #[cfg(not(windows))]
    #[test]
    fn test_windows_backend_unavailable_elsewhere() {
        let result = create_recognizer(OcrBackend::WindowsOcr, &TesseractSettings::default());
        assert!(matches!(result, Err(VisionError::Backend(_))));
    }
}
