//! Application Configuration
//!
//! User settings and preferences stored in TOML format.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::vision::{OcrBackend, RecognitionLanguage, RecognitionLevel, DEFAULT_DIVISION_COUNT};

/// Application settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Recognition settings
    pub recognition: RecognitionSettings,
    /// Tesseract backend settings
    pub tesseract: TesseractSettings,
}

/// Recognition-related settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionSettings {
    /// OCR backend
    pub backend: OcrBackend,
    /// Language selected at startup
    pub language: RecognitionLanguage,
    /// Accuracy mode passed to the backend
    pub level: RecognitionLevel,
    /// Let the backend correct words against its language model
    pub uses_language_correction: bool,
    /// Number of bands the image height is divided by
    pub division_count: u32,
    /// Maximum patches recognized at the same time
    pub max_concurrent_patches: usize,
    /// Drop repeated lines read in two overlapping patches
    pub deduplicate_overlaps: bool,
}

impl Default for RecognitionSettings {
    fn default() -> Self {
        Self {
            backend: OcrBackend::default(),
            language: RecognitionLanguage::English,
            level: RecognitionLevel::Accurate,
            uses_language_correction: true,
            division_count: DEFAULT_DIVISION_COUNT,
            max_concurrent_patches: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            deduplicate_overlaps: false,
        }
    }
}

/// Tesseract CLI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseractSettings {
    /// Path or name of the tesseract executable
    pub binary: PathBuf,
    /// Page segmentation mode (6 = a single uniform block of text)
    pub page_seg_mode: u32,
}

impl Default for TesseractSettings {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            page_seg_mode: 6,
        }
    }
}

/// Get the configuration directory
pub fn get_config_dir() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "textcamera", "TextCamera")
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

    let config_dir = proj_dirs.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir)?;

    Ok(config_dir)
}

/// Load configuration from file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Save configuration to file
pub fn save_config(config: &AppConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_app_config() {
        let config = AppConfig::default();

        assert_eq!(config.recognition.language, RecognitionLanguage::English);
        assert_eq!(config.recognition.level, RecognitionLevel::Accurate);
        assert!(config.recognition.uses_language_correction);
        assert_eq!(config.recognition.division_count, 8);
        assert!(config.recognition.max_concurrent_patches >= 1);
        assert!(!config.recognition.deduplicate_overlaps);

        assert_eq!(config.tesseract.binary, PathBuf::from("tesseract"));
        assert_eq!(config.tesseract.page_seg_mode, 6);
    }

    #[test]
    fn test_config_with_custom_values() {
        let mut config = AppConfig::default();
        config.recognition.language = RecognitionLanguage::Korean;
        config.recognition.division_count = 4;
        config.recognition.deduplicate_overlaps = true;

        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed.recognition.language, RecognitionLanguage::Korean);
        assert_eq!(parsed.recognition.division_count, 4);
        assert!(parsed.recognition.deduplicate_overlaps);
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let parsed: AppConfig = toml::from_str(
            r#"
            [recognition]
            language = "ja-JP"
            level = "fast"
            "#,
        )
        .unwrap();

        assert_eq!(parsed.recognition.language, RecognitionLanguage::Japanese);
        assert_eq!(parsed.recognition.level, RecognitionLevel::Fast);
        assert_eq!(parsed.recognition.division_count, 8);
        assert_eq!(parsed.tesseract.page_seg_mode, 6);
    }

    #[test]
    fn test_save_and_load_config() {
        let config = AppConfig::default();
        let temp_file = NamedTempFile::new().unwrap();

        save_config(&config, temp_file.path()).unwrap();
        let loaded = load_config(temp_file.path()).unwrap();

        assert_eq!(config.recognition.division_count, loaded.recognition.division_count);
        assert_eq!(config.recognition.backend, loaded.recognition.backend);
    }

    #[test]
    fn test_load_config_file_not_found() {
        let result = load_config(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "this is not valid toml {{{{").unwrap();

        let result = load_config(temp_file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_language_rejected() {
        let result: std::result::Result<AppConfig, toml::de::Error> = toml::from_str(
            r#"
            [recognition]
            language = "xx-XX"
            "#,
        );
        assert!(result.is_err());
    }
}
