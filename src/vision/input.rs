//! Photo decoding
//!
//! Cameras store pixels in sensor orientation and record the rotation in
//! EXIF. The pipeline expects an upright raster, so the orientation is
//! applied while decoding.

use image::metadata::Orientation;
use image::{DynamicImage, ImageDecoder, ImageReader, RgbaImage};
use std::io::{BufRead, Cursor, Seek};
use std::path::Path;
use tracing::debug;

use super::error::{Result, VisionError};

/// Decode an image file into an upright RGBA raster
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    let reader = ImageReader::open(path)?.with_guessed_format()?;
    decode_upright(reader)
}

/// Decode encoded image bytes into an upright RGBA raster
pub fn decode_image(bytes: &[u8]) -> Result<RgbaImage> {
    let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
    decode_upright(reader)
}

fn decode_upright<R: BufRead + Seek>(reader: ImageReader<R>) -> Result<RgbaImage> {
    let mut decoder = reader.into_decoder()?;
    let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

    let mut image = DynamicImage::from_decoder(decoder)?;
    if orientation != Orientation::NoTransforms {
        debug!("Applying EXIF orientation {:?}", orientation);
        image.apply_orientation(orientation);
    }

    let rgba = image.into_rgba8();
    if rgba.width() == 0 || rgba.height() == 0 {
        return Err(VisionError::ImageDecode(format!(
            "decoded image is empty ({}x{})",
            rgba.width(),
            rgba.height()
        )));
    }

    Ok(rgba)
}
