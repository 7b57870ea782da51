//! Recognition language selection
//!
//! The fixed set of languages the camera front end offers, identified by
//! BCP-47 style tags.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::VisionError;

/// Language hint handed to the recognition backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RecognitionLanguage {
    #[default]
    #[serde(rename = "en-US")]
    English,
    #[serde(rename = "ko-KR")]
    Korean,
    #[serde(rename = "ja-JP")]
    Japanese,
    #[serde(rename = "zh-Hans")]
    ChineseSimplified,
    #[serde(rename = "es-ES")]
    Spanish,
    #[serde(rename = "fr-FR")]
    French,
    #[serde(rename = "de-DE")]
    German,
}

impl RecognitionLanguage {
    /// Every supported language, in menu order
    pub const ALL: [RecognitionLanguage; 7] = [
        RecognitionLanguage::English,
        RecognitionLanguage::Korean,
        RecognitionLanguage::Japanese,
        RecognitionLanguage::ChineseSimplified,
        RecognitionLanguage::Spanish,
        RecognitionLanguage::French,
        RecognitionLanguage::German,
    ];

    /// Language tag (e.g. "en-US")
    pub fn tag(&self) -> &'static str {
        match self {
            RecognitionLanguage::English => "en-US",
            RecognitionLanguage::Korean => "ko-KR",
            RecognitionLanguage::Japanese => "ja-JP",
            RecognitionLanguage::ChineseSimplified => "zh-Hans",
            RecognitionLanguage::Spanish => "es-ES",
            RecognitionLanguage::French => "fr-FR",
            RecognitionLanguage::German => "de-DE",
        }
    }

    /// Human readable name for menus
    pub fn display_name(&self) -> &'static str {
        match self {
            RecognitionLanguage::English => "English",
            RecognitionLanguage::Korean => "Korean",
            RecognitionLanguage::Japanese => "Japanese",
            RecognitionLanguage::ChineseSimplified => "Chinese (Simplified)",
            RecognitionLanguage::Spanish => "Spanish",
            RecognitionLanguage::French => "French",
            RecognitionLanguage::German => "German",
        }
    }

    /// Tesseract traineddata code for this language
    pub fn tesseract_code(&self) -> &'static str {
        match self {
            RecognitionLanguage::English => "eng",
            RecognitionLanguage::Korean => "kor",
            RecognitionLanguage::Japanese => "jpn",
            RecognitionLanguage::ChineseSimplified => "chi_sim",
            RecognitionLanguage::Spanish => "spa",
            RecognitionLanguage::French => "fra",
            RecognitionLanguage::German => "deu",
        }
    }
}

impl fmt::Display for RecognitionLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for RecognitionLanguage {
    type Err = VisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RecognitionLanguage::ALL
            .iter()
            .copied()
            .find(|lang| lang.tag().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| VisionError::UnsupportedLanguage(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_language_is_english() {
        assert_eq!(RecognitionLanguage::default(), RecognitionLanguage::English);
    }

    #[test]
    fn test_parse_from_tag() {
        assert_eq!("ko-KR".parse::<RecognitionLanguage>().unwrap(), RecognitionLanguage::Korean);
        assert_eq!("zh-hans".parse::<RecognitionLanguage>().unwrap(), RecognitionLanguage::ChineseSimplified);
        assert!("xx-XX".parse::<RecognitionLanguage>().is_err());
    }

    #[test]
    fn test_tags_round_trip_through_display() {
        for lang in RecognitionLanguage::ALL {
            let parsed: RecognitionLanguage = lang.to_string().parse().unwrap();
            assert_eq!(parsed, lang);
        }
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&RecognitionLanguage::Japanese).unwrap();
        assert_eq!(json, "\"ja-JP\"");
    }
}
