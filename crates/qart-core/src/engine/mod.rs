//! QR encoding engines.
//!
//! The bridge talks to an engine through the [`Engine`] trait: one call, one
//! [`QartConfig`] in, either PNG bytes or an [`EngineError`] out. The engine
//! owns every semantic decision about version, mask, scale, rotation and the
//! reference image; the bridge passes its errors through untouched.
//!
//! [`HalftoneEngine`] is the engine shipped with the bridge. It builds a
//! high-redundancy QR symbol and blends a reference image into the pixels
//! around each module's centre, so the symbol stays scannable while taking on
//! the look of the picture.
//!
//! # Pipeline
//!
//! 1. Validate version, mask and scale
//! 2. Build the module matrix and the function-pattern map (`matrix`)
//! 3. Decode, orient, resize and binarize the reference image (`reference`)
//! 4. Paint cells, add the quiet zone and rotate (`render`)
//! 5. Encode as grayscale PNG (`png`)

mod matrix;
mod png;
mod reference;
mod render;

use rand::rngs::StdRng;
use rand::SeedableRng;
use thiserror::Error;

use crate::QartConfig;

pub use matrix::{Symbol, MAX_VERSION};
pub use render::{MAX_OUTPUT_EDGE, QUIET_ZONE};

/// Errors reported by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Version outside 0..=40.
    #[error("invalid version {0}: expected 0 (auto) or 1-40")]
    InvalidVersion(i32),

    /// Mask above 7.
    #[error("invalid mask {0}: expected a negative value (auto) or 0-7")]
    InvalidMask(i32),

    /// Negative scale.
    #[error("invalid scale {0}: must not be negative")]
    InvalidScale(i32),

    /// The rendered image would exceed the size limit.
    #[error("output too large: {edge}px edge exceeds {max}px")]
    OutputTooLarge { edge: u64, max: u32 },

    /// The payload does not fit the requested version.
    #[error("capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// The reference image bytes could not be decoded.
    #[error("invalid reference image: {0}")]
    InvalidReferenceImage(String),

    /// PNG encoding failed.
    #[error("PNG encoding failed: {0}")]
    EncodingFailed(String),
}

/// Output of a successful encode.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedImage {
    /// The finished image as PNG bytes.
    pub png: Vec<u8>,
    /// Function-pattern overlay, present when `save_control` was requested.
    pub control_png: Option<Vec<u8>>,
}

/// An encoder that turns a [`QartConfig`] into an image.
pub trait Engine {
    /// Encode one request. Called exactly once per bridge call.
    fn encode(&self, config: &QartConfig) -> Result<EncodedImage, EngineError>;
}

impl<E: Engine + ?Sized> Engine for &E {
    fn encode(&self, config: &QartConfig) -> Result<EncodedImage, EngineError> {
        (**self).encode(config)
    }
}

/// Halftone QR engine.
///
/// Without a seed, randomized pixels draw from OS entropy on every call.
#[derive(Debug, Clone, Default)]
pub struct HalftoneEngine {
    seed: Option<u64>,
}

impl HalftoneEngine {
    /// Create an engine that draws randomness from entropy.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an engine with reproducible randomized output.
    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Engine for HalftoneEngine {
    fn encode(&self, config: &QartConfig) -> Result<EncodedImage, EngineError> {
        let version = match config.version {
            0 => None,
            v if (1..=i32::from(MAX_VERSION)).contains(&v) => Some(v as u8),
            v => return Err(EngineError::InvalidVersion(v)),
        };
        let mask = match config.mask {
            m if m < 0 => None,
            m if m <= 7 => Some(m as u8),
            m => return Err(EngineError::InvalidMask(m)),
        };
        // Zero is the unset value and means the smallest scale.
        let scale = match config.scale {
            s if s < 0 => return Err(EngineError::InvalidScale(s)),
            0 => 1,
            s => s as u32,
        };

        let symbol = Symbol::encode(&config.payload, version, mask)?;
        let layout = render::Layout::new(symbol.size(), scale)?;
        log::debug!(
            "[QART] symbol version {} mask {} ({} modules, {}px)",
            symbol.version(),
            symbol.mask(),
            symbol.size(),
            layout.edge()
        );

        let mut rng = self.rng();
        let halftone = match &config.reference_image {
            Some(bytes) => {
                let tone = reference::ToneAdjust {
                    brightness: config.brightness,
                    contrast: config.contrast,
                };
                let binarize = reference::Binarize::from_flags(config.dither, config.randomize);
                let gray = reference::load_reference(bytes, layout.symbol_edge(), tone)?;
                Some(reference::binarize(&gray, binarize, &mut rng))
            }
            None => None,
        };

        let style = render::Style {
            only_data_bits: config.only_data_bits,
            randomize: config.randomize,
        };
        let image = render::render(&symbol, &layout, halftone.as_ref(), style, &mut rng);
        let image = render::rotate(image, config.rotation);
        let png = png::encode_png(&image)?;

        let control_png = if config.save_control {
            let control = render::rotate(render::render_control(&symbol, &layout), config.rotation);
            Some(png::encode_png(&control)?)
        } else {
            None
        };

        Ok(EncodedImage { png, control_png })
    }
}
