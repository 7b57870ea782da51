//! Patch slicing
//!
//! Recognition engines lose accuracy on tall images holding many lines of
//! text. The slicer cuts the source into overlapping horizontal bands so each
//! band holds only a few lines. Overlap is half a band, which guarantees a
//! line split at one band's edge is whole in the neighbouring band.

use image::{imageops, RgbaImage};
use std::ops::Range;
use tracing::debug;

use super::error::{Result, VisionError};

/// Default number of bands the source height is divided by
pub const DEFAULT_DIVISION_COUNT: u32 = 8;

/// Band geometry for one source height
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchLayout {
    /// Source image height in pixels
    pub source_height: u32,
    /// Height of every full band in pixels
    pub patch_height: u32,
    /// Rows shared by consecutive bands
    pub overlap: u32,
    /// Number of bands
    pub count: u32,
}

impl PatchLayout {
    /// Compute the layout for a source of `source_height` rows
    pub fn new(source_height: u32, division_count: u32) -> Result<Self> {
        if source_height == 0 {
            return Err(VisionError::ImageDecode("source image has zero height".into()));
        }
        let division_count = division_count.max(1);

        let patch_height = source_height / division_count;
        if patch_height < 2 {
            // Too short to band; recognize it whole
            return Ok(Self {
                source_height,
                patch_height: source_height,
                overlap: 0,
                count: 1,
            });
        }

        let overlap = patch_height / 2;
        let step = patch_height - overlap;
        let count = (source_height - overlap).div_ceil(step);

        Ok(Self {
            source_height,
            patch_height,
            overlap,
            count,
        })
    }

    /// Distance between the tops of consecutive bands
    pub fn step(&self) -> u32 {
        self.patch_height - self.overlap
    }

    /// Row range covered by band `index`, clipped to the source
    pub fn range(&self, index: u32) -> Range<u32> {
        let start = index * self.step();
        let end = (start + self.patch_height).min(self.source_height);
        start..end
    }

    /// All band ranges, top to bottom
    pub fn ranges(&self) -> impl Iterator<Item = Range<u32>> + '_ {
        (0..self.count).map(move |i| self.range(i))
    }
}

/// A horizontal band of the source image
#[derive(Debug, Clone)]
pub struct Patch {
    /// Position in the band sequence (0 = topmost)
    pub index: usize,
    /// First source row covered, counted from the top
    pub top: u32,
    /// Rows covered
    pub height: u32,
    /// Height of the source image the band was cut from
    pub source_height: u32,
    /// Band pixels
    pub image: RgbaImage,
}

impl Patch {
    /// Source rows covered by this band
    pub fn rows(&self) -> Range<u32> {
        self.top..self.top + self.height
    }

    /// Band height as a fraction of the source height
    pub fn height_fraction(&self) -> f32 {
        self.height as f32 / self.source_height as f32
    }

    /// Source height divided by band height
    ///
    /// Equals the division count for every full band.
    pub fn division_ratio(&self) -> f32 {
        self.source_height as f32 / self.height as f32
    }

    /// Bottom edge of the band in source normalized space (bottom-left origin)
    pub fn offset_fraction(&self) -> f32 {
        (self.source_height - (self.top + self.height)) as f32 / self.source_height as f32
    }
}

/// Cuts images into overlapping horizontal bands
#[derive(Debug, Clone, Copy)]
pub struct PatchSlicer {
    division_count: u32,
}

impl Default for PatchSlicer {
    fn default() -> Self {
        Self::new(DEFAULT_DIVISION_COUNT)
    }
}

impl PatchSlicer {
    /// Create a slicer dividing the source height by `division_count`
    pub fn new(division_count: u32) -> Self {
        Self {
            division_count: division_count.max(1),
        }
    }

    pub fn division_count(&self) -> u32 {
        self.division_count
    }

    /// Slice `image` into bands, top to bottom
    pub fn slice(&self, image: &RgbaImage) -> Result<Vec<Patch>> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::ImageDecode(format!(
                "cannot slice empty image ({}x{})",
                width, height
            )));
        }

        let layout = PatchLayout::new(height, self.division_count)?;
        debug!(
            "Slicing {}x{} image into {} patches (patch height {}, overlap {})",
            width, height, layout.count, layout.patch_height, layout.overlap
        );

        let patches = layout
            .ranges()
            .enumerate()
            .map(|(index, rows)| Patch {
                index,
                top: rows.start,
                height: rows.end - rows.start,
                source_height: height,
                image: imageops::crop_imm(image, 0, rows.start, width, rows.end - rows.start)
                    .to_image(),
            })
            .collect();

        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn assert_full_coverage(layout: &PatchLayout) {
        let ranges: Vec<_> = layout.ranges().collect();
        assert_eq!(ranges.first().unwrap().start, 0);
        assert_eq!(ranges.last().unwrap().end, layout.source_height);
        for pair in ranges.windows(2) {
            assert!(pair[1].start <= pair[0].end, "gap between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_layout_800() {
        let layout = PatchLayout::new(800, 8).unwrap();
        assert_eq!(layout.patch_height, 100);
        assert_eq!(layout.overlap, 50);
        assert_eq!(layout.count, 15);
        assert_eq!(layout.range(14), 700..800);
    }

    #[test]
    fn test_consecutive_overlap_is_sixteenth() {
        for height in [160, 800, 1600, 4032] {
            let layout = PatchLayout::new(height, 8).unwrap();
            let ranges: Vec<_> = layout.ranges().collect();
            for pair in ranges.windows(2) {
                assert_eq!(pair[0].end - pair[1].start, height / 16);
            }
        }
    }

    #[test]
    fn test_coverage_for_uneven_heights() {
        for height in 1..600 {
            let layout = PatchLayout::new(height, 8).unwrap();
            assert_full_coverage(&layout);
        }
    }

    #[test]
    fn test_final_patch_is_clipped() {
        let layout = PatchLayout::new(801, 8).unwrap();
        assert_eq!(layout.count, 16);
        assert_eq!(layout.range(15), 750..801);
    }

    #[test]
    fn test_tiny_image_is_single_patch() {
        let layout = PatchLayout::new(10, 8).unwrap();
        assert_eq!(layout.count, 1);
        assert_eq!(layout.range(0), 0..10);
    }

    #[test]
    fn test_zero_height_fails() {
        assert!(matches!(PatchLayout::new(0, 8), Err(VisionError::ImageDecode(_))));

        let empty = RgbaImage::new(0, 0);
        let result = PatchSlicer::default().slice(&empty);
        assert!(matches!(result, Err(VisionError::ImageDecode(_))));
    }

    #[test]
    fn test_slice_copies_band_pixels() {
        // Each row is painted with its own index
        let image = RgbaImage::from_fn(4, 160, |_, y| Rgba([y as u8, 0, 0, 255]));
        let patches = PatchSlicer::new(8).slice(&image).unwrap();

        assert_eq!(patches.len(), 15);
        for patch in &patches {
            assert_eq!(patch.image.dimensions(), (4, patch.height));
            assert_eq!(patch.image.get_pixel(0, 0).0[0], patch.top as u8);
        }
        assert_eq!(patches[2].rows(), 20..40);
    }

    #[test]
    fn test_patch_fractions() {
        let image = RgbaImage::new(2, 800);
        let patches = PatchSlicer::new(8).slice(&image).unwrap();

        let first = &patches[0];
        assert!((first.height_fraction() - 0.125).abs() < 1e-6);
        assert!((first.division_ratio() - 8.0).abs() < 1e-6);
        assert!((first.offset_fraction() - 0.875).abs() < 1e-6);

        let last = patches.last().unwrap();
        assert!(last.offset_fraction().abs() < 1e-6);
    }
}
