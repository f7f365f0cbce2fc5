//! PNG output.
//!
//! Rendered symbols are pure black and white (plus one gray level in the
//! control image), so they are written as 8-bit grayscale.

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder};
use std::io::Cursor;

use super::EngineError;

/// Encode a grayscale image to PNG bytes.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, EngineError> {
    let (width, height) = img.dimensions();
    let mut buffer = Cursor::new(Vec::new());

    PngEncoder::new(&mut buffer)
        .write_image(img.as_raw(), width, height, ExtendedColorType::L8)
        .map_err(|e| EngineError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}
