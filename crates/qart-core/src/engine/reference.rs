//! Reference image preparation.
//!
//! The reference (halftone) image is decoded with its EXIF orientation
//! applied, cropped and scaled to fill the symbol area, flattened onto white,
//! tone adjusted, and finally reduced to one bit per output pixel.

use std::io::Cursor;

use exif::{In, Reader, Tag};
use image::imageops::FilterType;
use image::{DynamicImage, GrayImage, ImageReader, Luma};
use rand::Rng;

use super::EngineError;

/// ITU-R BT.709 luminance coefficients.
const LUMA_R: f32 = 0.2126;
const LUMA_G: f32 = 0.7152;
const LUMA_B: f32 = 0.0722;

/// Pixels darker than this are dark when no dithering is requested.
pub const THRESHOLD: u8 = 128;

/// Brightness and contrast applied to the reference before binarizing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToneAdjust {
    /// Added to every gray value
    pub brightness: i32,
    /// Percent change of the distance from mid-gray (-100 flattens)
    pub contrast: i32,
}

impl ToneAdjust {
    pub fn is_identity(&self) -> bool {
        self.brightness == 0 && self.contrast == 0
    }

    #[inline]
    pub fn apply(&self, value: u8) -> u8 {
        let mut v = i64::from(value) + i64::from(self.brightness);
        let factor = i64::from(self.contrast).max(-100) + 100;
        v = (v - 128) * factor / 100 + 128;
        v.clamp(0, 255) as u8
    }
}

/// How gray values become dark/light pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binarize {
    /// Fixed threshold at [`THRESHOLD`].
    Threshold,
    /// A fresh random threshold per pixel.
    RandomThreshold,
    /// Floyd–Steinberg error diffusion.
    FloydSteinberg,
}

impl Binarize {
    /// Dithering takes precedence over randomization.
    pub fn from_flags(dither: bool, randomize: bool) -> Self {
        match (dither, randomize) {
            (true, _) => Binarize::FloydSteinberg,
            (false, true) => Binarize::RandomThreshold,
            (false, false) => Binarize::Threshold,
        }
    }
}

/// A binarized reference, one flag per pixel of the symbol area.
#[derive(Debug, Clone)]
pub struct Halftone {
    edge: u32,
    dark: Vec<bool>,
}

impl Halftone {
    #[inline]
    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        self.dark[(y * self.edge + x) as usize]
    }

    pub fn edge(&self) -> u32 {
        self.edge
    }
}

/// Decode `bytes` and produce an `edge`×`edge` grayscale reference.
///
/// # Errors
///
/// Returns `EngineError::InvalidReferenceImage` if the bytes are not a
/// decodable image.
pub fn load_reference(bytes: &[u8], edge: u32, tone: ToneAdjust) -> Result<GrayImage, EngineError> {
    let orientation = extract_orientation(bytes);

    let img = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| EngineError::InvalidReferenceImage(e.to_string()))?
        .decode()
        .map_err(|e| EngineError::InvalidReferenceImage(e.to_string()))?;

    let img = apply_orientation(img, orientation).resize_to_fill(edge, edge, FilterType::Triangle);
    let mut gray = flatten_to_gray(&img);

    if !tone.is_identity() {
        for pixel in gray.pixels_mut() {
            pixel.0[0] = tone.apply(pixel.0[0]);
        }
    }
    Ok(gray)
}

/// Reduce a gray image to dark/light pixels.
pub fn binarize<R: Rng>(gray: &GrayImage, mode: Binarize, rng: &mut R) -> Halftone {
    let (width, height) = gray.dimensions();
    debug_assert_eq!(width, height);

    let dark = match mode {
        Binarize::Threshold => gray.pixels().map(|p| p.0[0] < THRESHOLD).collect(),
        Binarize::RandomThreshold => gray
            .pixels()
            .map(|p| p.0[0] < rng.gen_range(1..=255u8))
            .collect(),
        Binarize::FloydSteinberg => floyd_steinberg(gray),
    };

    Halftone { edge: width, dark }
}

fn floyd_steinberg(gray: &GrayImage) -> Vec<bool> {
    let (width, height) = (gray.width() as usize, gray.height() as usize);
    let mut levels: Vec<f32> = gray.pixels().map(|p| f32::from(p.0[0])).collect();
    let mut dark = vec![false; levels.len()];

    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let old = levels[i];
            let is_dark = old < f32::from(THRESHOLD);
            dark[i] = is_dark;
            let err = old - if is_dark { 0.0 } else { 255.0 };

            if x + 1 < width {
                levels[i + 1] += err * 7.0 / 16.0;
            }
            if y + 1 < height {
                if x > 0 {
                    levels[i + width - 1] += err * 3.0 / 16.0;
                }
                levels[i + width] += err * 5.0 / 16.0;
                if x + 1 < width {
                    levels[i + width + 1] += err / 16.0;
                }
            }
        }
    }
    dark
}

/// Luminance with alpha composited over white, so transparent backgrounds
/// read as light.
fn flatten_to_gray(img: &DynamicImage) -> GrayImage {
    let rgba = img.to_rgba8();
    let mut out = GrayImage::new(rgba.width(), rgba.height());
    for (src, dst) in rgba.pixels().zip(out.pixels_mut()) {
        let [r, g, b, a] = src.0;
        let lum = LUMA_R * f32::from(r) + LUMA_G * f32::from(g) + LUMA_B * f32::from(b);
        let alpha = f32::from(a) / 255.0;
        let v = lum * alpha + 255.0 * (1.0 - alpha);
        *dst = Luma([v.clamp(0.0, 255.0).round() as u8]);
    }
    out
}

/// EXIF orientation tag value, 1 when absent.
fn extract_orientation(bytes: &[u8]) -> u32 {
    let mut cursor = Cursor::new(bytes);
    Reader::new()
        .read_from_container(&mut cursor)
        .ok()
        .and_then(|exif| {
            exif.get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
        })
        .unwrap_or(1)
}

fn apply_orientation(img: DynamicImage, orientation: u32) -> DynamicImage {
    match orientation {
        2 => img.fliph(),
        3 => img.rotate180(),
        4 => img.flipv(),
        5 => img.rotate90().fliph(),
        6 => img.rotate90(),
        7 => img.rotate270().fliph(),
        8 => img.rotate270(),
        _ => img,
    }
}
