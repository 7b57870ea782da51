//! Windows OCR API backend
//!
//! Uses the built-in Windows OCR (Media.Ocr). The engine has no accuracy
//! level or language correction switches, so those request fields are
//! ignored here.

use anyhow::{Context, Result as AnyResult};
use image::RgbaImage;
use tracing::{debug, warn};
use windows::{
    core::HSTRING,
    Foundation::IAsyncOperation,
    Globalization::Language,
    Graphics::Imaging::{BitmapPixelFormat, SoftwareBitmap},
    Media::Ocr::{OcrEngine as WinOcrEngine, OcrResult as WinOcrResult},
};

use super::error::{Result, VisionError};
use super::observation::{NormalizedRect, Observation};
use super::{RecognitionRequest, TextRecognizer};

/// Windows OCR engine wrapper
///
/// An engine is created per request since each request may carry a
/// different language.
#[derive(Debug, Default)]
pub struct WindowsOcr;

impl WindowsOcr {
    pub fn new() -> Self {
        Self
    }

    /// Get available OCR languages on this system
    pub fn available_languages() -> Result<Vec<String>> {
        let list = || -> AnyResult<Vec<String>> {
            let languages = WinOcrEngine::AvailableRecognizerLanguages()
                .context("Failed to get available languages")?;

            let mut result = Vec::new();
            for i in 0..languages.Size().context("Failed to get languages size")? {
                if let Ok(lang) = languages.GetAt(i) {
                    if let Ok(tag) = lang.LanguageTag() {
                        result.push(tag.to_string());
                    }
                }
            }
            Ok(result)
        };

        list().map_err(backend_error)
    }
}

impl TextRecognizer for WindowsOcr {
    fn name(&self) -> &str {
        "windows-ocr"
    }

    fn recognize(&self, image: &RgbaImage, request: &RecognitionRequest) -> Result<Vec<Observation>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(vec![]);
        }

        let run = || -> AnyResult<Vec<Observation>> {
            let engine = create_engine(request.language.tag())?;
            let bgra_data = rgba_to_bgra(image.as_raw());
            let bitmap = create_software_bitmap(&bgra_data, width, height)?;
            let ocr_result = run_ocr_sync(&engine, &bitmap)?;
            extract_lines(&ocr_result, width, height)
        };

        let observations = run().map_err(backend_error)?;
        debug!("Windows OCR: Found {} lines in {}x{} patch", observations.len(), width, height);
        Ok(observations)
    }
}

fn backend_error(err: anyhow::Error) -> VisionError {
    VisionError::Backend(format!("{:#}", err))
}

/// Create an engine for `language_tag`, falling back to the user profile languages
fn create_engine(language_tag: &str) -> AnyResult<WinOcrEngine> {
    let language = Language::CreateLanguage(&HSTRING::from(language_tag))
        .context("Failed to create language")?;

    if !WinOcrEngine::IsLanguageSupported(&language).context("Failed to check language support")? {
        warn!("Language '{}' not supported, falling back to system default", language_tag);
        return WinOcrEngine::TryCreateFromUserProfileLanguages()
            .context("Failed to create OCR engine from user profile");
    }

    WinOcrEngine::TryCreateFromLanguage(&language).context("Failed to create OCR engine for language")
}

/// Convert RGBA to BGRA (Windows expects BGRA)
fn rgba_to_bgra(rgba: &[u8]) -> Vec<u8> {
    let mut bgra = rgba.to_vec();
    for chunk in bgra.chunks_exact_mut(4) {
        chunk.swap(0, 2);
    }
    bgra
}

/// Create a SoftwareBitmap from BGRA data using CopyFromBuffer
fn create_software_bitmap(bgra_data: &[u8], width: u32, height: u32) -> AnyResult<SoftwareBitmap> {
    use windows::Storage::Streams::{DataReader, DataWriter, InMemoryRandomAccessStream};

    let stream = InMemoryRandomAccessStream::new().context("Failed to create in-memory stream")?;
    let writer = DataWriter::CreateDataWriter(&stream).context("Failed to create data writer")?;

    writer.WriteBytes(bgra_data).context("Failed to write pixel data")?;
    writer
        .StoreAsync()
        .context("Failed to start store operation")?
        .get()
        .context("Failed to store data")?;
    writer
        .FlushAsync()
        .context("Failed to start flush operation")?
        .get()
        .context("Failed to flush data")?;

    let bitmap = SoftwareBitmap::Create(BitmapPixelFormat::Bgra8, width as i32, height as i32)
        .context("Failed to create SoftwareBitmap")?;

    let input_stream = stream.GetInputStreamAt(0).context("Failed to get input stream")?;
    let reader = DataReader::CreateDataReader(&input_stream).context("Failed to create data reader")?;
    reader
        .LoadAsync(bgra_data.len() as u32)
        .context("Failed to start load operation")?
        .get()
        .context("Failed to load data")?;

    let buffer = reader
        .ReadBuffer(bgra_data.len() as u32)
        .context("Failed to read buffer")?;
    bitmap.CopyFromBuffer(&buffer).context("Failed to copy buffer to bitmap")?;

    Ok(bitmap)
}

/// Run OCR synchronously (blocks until complete)
fn run_ocr_sync(engine: &WinOcrEngine, bitmap: &SoftwareBitmap) -> AnyResult<WinOcrResult> {
    let async_op: IAsyncOperation<WinOcrResult> = engine
        .RecognizeAsync(bitmap)
        .context("Failed to start OCR recognition")?;

    async_op.get().context("OCR recognition failed")
}

/// One observation per OCR line, bounded by the union of its word boxes
fn extract_lines(ocr_result: &WinOcrResult, width: u32, height: u32) -> AnyResult<Vec<Observation>> {
    let mut observations = Vec::new();

    let lines = ocr_result.Lines().context("Failed to get OCR lines")?;

    for i in 0..lines.Size().context("Failed to get lines size")? {
        let line = lines.GetAt(i).context("Failed to get line")?;
        let text = line.Text().context("Failed to get line text")?.to_string();
        if text.trim().is_empty() {
            continue;
        }

        let words = line.Words().context("Failed to get words")?;
        let (mut left, mut top) = (f32::MAX, f32::MAX);
        let (mut right, mut bottom) = (f32::MIN, f32::MIN);

        for j in 0..words.Size().context("Failed to get words size")? {
            let rect = words
                .GetAt(j)
                .context("Failed to get word")?
                .BoundingRect()
                .context("Failed to get bounding rect")?;
            left = left.min(rect.X);
            top = top.min(rect.Y);
            right = right.max(rect.X + rect.Width);
            bottom = bottom.max(rect.Y + rect.Height);
        }

        if left > right || top > bottom {
            continue;
        }

        // Windows OCR doesn't provide confidence
        observations.push(Observation::new(
            text,
            1.0,
            NormalizedRect::from_pixel_rect(left, top, right - left, bottom - top, width, height),
        ));
    }

    Ok(observations)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_to_bgra() {
        let bgra = rgba_to_bgra(&[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(bgra, vec![3, 2, 1, 4, 7, 6, 5, 8]);
    }

    #[test]
    fn test_available_languages() {
        let languages = WindowsOcr::available_languages();
        assert!(languages.is_ok());
        // Most Windows installations have at least English
        assert!(!languages.unwrap().is_empty());
    }
}
