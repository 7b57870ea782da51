//! TextCamera - on-device text recognition for photographed documents
//!
//! Photos of documents are tall and dense; recognition engines read them
//! better in narrow bands. This crate slices an upright photo into
//! overlapping horizontal patches, recognizes the patches concurrently with
//! a pluggable backend and merges the results back into reading order.

pub mod config;
pub mod shared;
pub mod vision;

pub use config::{AppConfig, RecognitionSettings, TesseractSettings};
pub use shared::{RecognitionPhase, RecognitionState};
pub use vision::{
    MergedResult, Observation, OcrBackend, RecognitionLanguage, RecognitionPipeline,
    RecognitionRequest, TextRecognizer, VisionError,
};
