//! Tesseract OCR backend
//!
//! Runs the `tesseract` command line tool on each patch and parses its TSV
//! output into line-level observations. Requires the traineddata for the
//! selected language to be installed (e.g. `tesseract-ocr-kor`).

use image::{ImageFormat, RgbaImage};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

use super::error::{Result, VisionError};
use super::observation::{NormalizedRect, Observation};
use super::{RecognitionLevel, RecognitionRequest, TextRecognizer};
use crate::config::TesseractSettings;

/// Tesseract CLI engine wrapper
pub struct TesseractOcr {
    binary: PathBuf,
    page_seg_mode: u32,
}

impl TesseractOcr {
    pub fn new(settings: &TesseractSettings) -> Self {
        info!("Using tesseract binary {:?}", settings.binary);
        Self {
            binary: settings.binary.clone(),
            page_seg_mode: settings.page_seg_mode,
        }
    }

    /// Get the traineddata languages installed for this tesseract
    pub fn available_languages(&self) -> Result<Vec<String>> {
        let output = Command::new(&self.binary)
            .arg("--list-langs")
            .output()
            .map_err(|e| VisionError::Backend(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(VisionError::Backend(format!(
                "tesseract --list-langs failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        // First line is a header ("List of available languages ...")
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .skip(1)
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn command(&self, image_path: &std::path::Path, request: &RecognitionRequest) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.arg(image_path)
            .arg("stdout")
            .args(["-l", request.language.tesseract_code()])
            .arg("--psm")
            .arg(self.page_seg_mode.to_string())
            .args(["--oem", "1"]);

        if request.level == RecognitionLevel::Fast {
            // Skip the second pass over inverted text
            cmd.args(["-c", "tessedit_do_invert=0"]);
        }
        if !request.uses_language_correction {
            cmd.args(["-c", "load_system_dawg=0", "-c", "load_freq_dawg=0"]);
        }

        cmd.arg("tsv");
        cmd
    }
}

impl TextRecognizer for TesseractOcr {
    fn name(&self) -> &str {
        "tesseract"
    }

    fn recognize(&self, image: &RgbaImage, request: &RecognitionRequest) -> Result<Vec<Observation>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(vec![]);
        }

        let mut tmp = tempfile::Builder::new()
            .prefix("text-camera-")
            .suffix(".png")
            .tempfile()?;
        image
            .write_to(&mut tmp, ImageFormat::Png)
            .map_err(|e| VisionError::Backend(format!("failed to write patch image: {}", e)))?;
        tmp.flush()?;

        let output = self
            .command(tmp.path(), request)
            .output()
            .map_err(|e| VisionError::Backend(format!("failed to run tesseract: {}", e)))?;

        if !output.status.success() {
            return Err(VisionError::Backend(format!(
                "tesseract exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let tsv = String::from_utf8_lossy(&output.stdout);
        let observations = parse_tsv_lines(&tsv, width, height);
        debug!("Tesseract: Found {} lines in {}x{} patch", observations.len(), width, height);

        Ok(observations)
    }
}

/// Words of one TSV line being accumulated
struct LineAccumulator {
    key: (u32, u32, u32),
    words: Vec<String>,
    confidences: Vec<f32>,
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
}

impl LineAccumulator {
    fn into_observation(self, width: u32, height: u32) -> Option<Observation> {
        if self.words.is_empty() {
            return None;
        }

        let confidence = if self.confidences.is_empty() {
            0.0
        } else {
            self.confidences.iter().sum::<f32>() / self.confidences.len() as f32 / 100.0
        };

        Some(Observation::new(
            self.words.join(" "),
            confidence.clamp(0.0, 1.0),
            NormalizedRect::from_pixel_rect(
                self.left,
                self.top,
                self.right - self.left,
                self.bottom - self.top,
                width,
                height,
            ),
        ))
    }
}

/// Parse `tesseract ... tsv` output into one observation per text line
///
/// Columns: level page_num block_num par_num line_num word_num left top
/// width height conf text. Word rows (level 5) are grouped by their
/// (block, paragraph, line) numbers, which tesseract emits contiguously.
pub fn parse_tsv_lines(tsv: &str, width: u32, height: u32) -> Vec<Observation> {
    let mut lines: Vec<LineAccumulator> = Vec::new();

    for row in tsv.lines().skip(1) {
        let cols: Vec<&str> = row.splitn(12, '\t').collect();
        if cols.len() < 12 || cols[0] != "5" {
            continue;
        }

        let text = cols[11].trim();
        if text.is_empty() {
            continue;
        }

        let parse_u32 = |s: &str| s.trim().parse::<u32>().unwrap_or(0);
        let parse_f32 = |s: &str| s.trim().parse::<f32>().unwrap_or(0.0);

        let key = (parse_u32(cols[2]), parse_u32(cols[3]), parse_u32(cols[4]));
        let left = parse_f32(cols[6]);
        let top = parse_f32(cols[7]);
        let right = left + parse_f32(cols[8]);
        let bottom = top + parse_f32(cols[9]);
        let conf = cols[10].trim().parse::<f32>().unwrap_or(-1.0);

        match lines.last_mut() {
            Some(line) if line.key == key => {
                line.left = line.left.min(left);
                line.top = line.top.min(top);
                line.right = line.right.max(right);
                line.bottom = line.bottom.max(bottom);
                line.words.push(text.to_string());
                if conf >= 0.0 {
                    line.confidences.push(conf);
                }
            }
            _ => lines.push(LineAccumulator {
                key,
                words: vec![text.to_string()],
                confidences: if conf >= 0.0 { vec![conf] } else { vec![] },
                left,
                top,
                right,
                bottom,
            }),
        }
    }

    lines
        .into_iter()
        .filter_map(|line| line.into_observation(width, height))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vision::RecognitionLanguage;

    const SAMPLE_TSV: &str = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext
1\t1\t0\t0\t0\t0\t0\t0\t200\t100\t-1\t
4\t1\t1\t1\t1\t0\t10\t10\t120\t20\t-1\t
5\t1\t1\t1\t1\t1\t10\t10\t50\t20\t96.5\tHello
5\t1\t1\t1\t1\t2\t70\t12\t60\t18\t91.5\tworld
4\t1\t1\t1\t2\t0\t10\t60\t80\t20\t-1\t
5\t1\t1\t1\t2\t1\t10\t60\t80\t20\t88\tSecond
5\t1\t1\t1\t2\t2\t95\t60\t5\t20\t-1\t
";

    #[test]
    fn test_parse_tsv_groups_words_into_lines() {
        let observations = parse_tsv_lines(SAMPLE_TSV, 200, 100);
        assert_eq!(observations.len(), 2);

        assert_eq!(observations[0].top_candidate(), Some("Hello world"));
        assert!((observations[0].candidates[0].confidence - 0.94).abs() < 1e-4);

        // Union of word boxes: x 10..130, y 10..30 in a 200x100 image
        let bounds = observations[0].bounds;
        assert!((bounds.x - 0.05).abs() < 1e-6);
        assert!((bounds.width - 0.6).abs() < 1e-6);
        assert!((bounds.height - 0.2).abs() < 1e-6);
        assert!((bounds.y - 0.7).abs() < 1e-6);

        assert_eq!(observations[1].top_candidate(), Some("Second"));
    }

    #[test]
    fn test_parse_tsv_empty_output() {
        assert!(parse_tsv_lines("", 10, 10).is_empty());
        assert!(parse_tsv_lines("level\tpage_num\n", 10, 10).is_empty());
    }

    #[test]
    fn test_command_arguments() {
        let ocr = TesseractOcr::new(&TesseractSettings::default());
        let request = RecognitionRequest {
            language: RecognitionLanguage::Korean,
            level: RecognitionLevel::Fast,
            uses_language_correction: false,
        };

        let cmd = ocr.command(std::path::Path::new("patch.png"), &request);
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert_eq!(args[0], "patch.png");
        assert!(args.windows(2).any(|w| w[0] == "-l" && w[1] == "kor"));
        assert!(args.windows(2).any(|w| w[0] == "--psm" && w[1] == "6"));
        assert!(args.iter().any(|a| a == "tessedit_do_invert=0"));
        assert!(args.iter().any(|a| a == "load_system_dawg=0"));
        assert_eq!(args.last().map(String::as_str), Some("tsv"));
    }

    #[test]
    fn test_accurate_request_has_no_overrides() {
        let ocr = TesseractOcr::new(&TesseractSettings::default());
        let cmd = ocr.command(std::path::Path::new("p.png"), &RecognitionRequest::default());
        let args: Vec<String> = cmd.get_args().map(|a| a.to_string_lossy().into_owned()).collect();

        assert!(!args.iter().any(|a| a == "-c"));
        assert!(args.windows(2).any(|w| w[0] == "-l" && w[1] == "eng"));
    }

    #[test]
    fn test_empty_image_skips_tesseract() {
        let ocr = TesseractOcr::new(&TesseractSettings {
            binary: PathBuf::from("/nonexistent/tesseract"),
            page_seg_mode: 6,
        });
        let result = ocr.recognize(&RgbaImage::new(0, 0), &RecognitionRequest::default());
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_missing_binary_is_backend_error() {
        let ocr = TesseractOcr::new(&TesseractSettings {
            binary: PathBuf::from("/nonexistent/tesseract"),
            page_seg_mode: 6,
        });
        let result = ocr.recognize(&RgbaImage::new(4, 4), &RecognitionRequest::default());
        assert!(matches!(result, Err(VisionError::Backend(_))));
    }
}
