//! Recognized text spans and their normalized geometry

use serde::{Deserialize, Serialize};

/// Rectangle in normalized coordinates
///
/// All values are fractions of the image the rectangle was produced from.
/// The origin is the bottom-left corner, so `y` is the distance of the
/// rectangle's bottom edge from the bottom of the image.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedRect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Convert a top-left origin pixel rectangle into normalized space
    pub fn from_pixel_rect(
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        if image_width == 0 || image_height == 0 {
            return Self::default();
        }

        let iw = image_width as f32;
        let ih = image_height as f32;

        Self {
            x: x / iw,
            y: (ih - (y + height)) / ih,
            width: width / iw,
            height: height / ih,
        }
    }

    /// Top edge, measured from the bottom of the image
    pub fn top(&self) -> f32 {
        self.y + self.height
    }

    /// Whether the vertical extents of two rectangles intersect
    pub fn overlaps_vertically(&self, other: &NormalizedRect) -> bool {
        self.y < other.top() && other.y < self.top()
    }

    /// Convert back to a top-left origin pixel rectangle (x, y, width, height)
    pub fn to_pixel_rect(&self, image_width: u32, image_height: u32) -> (u32, u32, u32, u32) {
        let iw = image_width as f32;
        let ih = image_height as f32;
        (
            (self.x * iw).round() as u32,
            ((1.0 - self.top()) * ih).max(0.0).round() as u32,
            (self.width * iw).round() as u32,
            (self.height * ih).round() as u32,
        )
    }
}

/// One candidate transcription of a text span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    /// Confidence (0.0 - 1.0)
    pub confidence: f32,
}

/// A recognized text span
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Candidates, best first
    pub candidates: Vec<Candidate>,
    /// Bounding box in normalized coordinates of the producing image
    pub bounds: NormalizedRect,
}

impl Observation {
    /// Create an observation with a single candidate
    pub fn new(text: impl Into<String>, confidence: f32, bounds: NormalizedRect) -> Self {
        Self {
            candidates: vec![Candidate {
                text: text.into(),
                confidence,
            }],
            bounds,
        }
    }

    /// The best candidate string, if any
    pub fn top_candidate(&self) -> Option<&str> {
        self.candidates.first().map(|c| c.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pixel_rect_flips_origin() {
        // 100x200 image, box at the very top
        let rect = NormalizedRect::from_pixel_rect(10.0, 0.0, 50.0, 20.0, 100, 200);
        assert!((rect.x - 0.1).abs() < 1e-6);
        assert!((rect.y - 0.9).abs() < 1e-6);
        assert!((rect.width - 0.5).abs() < 1e-6);
        assert!((rect.height - 0.1).abs() < 1e-6);
        assert!((rect.top() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_pixel_rect_empty_image() {
        let rect = NormalizedRect::from_pixel_rect(1.0, 1.0, 1.0, 1.0, 0, 10);
        assert_eq!(rect, NormalizedRect::default());
    }

    #[test]
    fn test_to_pixel_rect() {
        let rect = NormalizedRect::new(0.1, 0.9, 0.5, 0.1);
        assert_eq!(rect.to_pixel_rect(100, 200), (10, 0, 50, 20));
    }

    #[test]
    fn test_vertical_overlap() {
        let a = NormalizedRect::new(0.0, 0.1, 1.0, 0.2);
        let b = NormalizedRect::new(0.0, 0.25, 1.0, 0.2);
        let c = NormalizedRect::new(0.0, 0.5, 1.0, 0.1);
        assert!(a.overlaps_vertically(&b));
        assert!(!a.overlaps_vertically(&c));
    }

    #[test]
    fn test_top_candidate() {
        let obs = Observation::new("hello", 0.9, NormalizedRect::default());
        assert_eq!(obs.top_candidate(), Some("hello"));

        let empty = Observation {
            candidates: vec![],
            bounds: NormalizedRect::default(),
        };
        assert_eq!(empty.top_candidate(), None);
    }
}
