//! Qart Core - the host-independent half of the qart bridge
//!
//! This crate turns a loosely-typed call (payload text, an option bag and an
//! optional reference image) into a validated [`QartConfig`], hands it to an
//! [`Engine`], and packages the resulting PNG as a base64 [`Envelope`].
//!
//! # Module Structure
//!
//! - `value` - Loosely-typed call values and their total coercions
//! - `marshal` - Argument validation and option extraction
//! - `bridge` - Engine invocation and result packaging
//! - `engine` - The engine seam plus the bundled halftone QR engine

pub mod bridge;
pub mod engine;
pub mod marshal;
pub mod value;

pub use bridge::{generate, package, BridgeError, Envelope};
pub use engine::{EncodedImage, Engine, EngineError, HalftoneEngine};
pub use marshal::{marshal, MarshalError};
pub use value::{OptionBag, Value};

/// A fully validated encode request.
///
/// Built fresh by [`marshal`] for every call and never mutated afterwards.
/// Numeric fields are passed through as received; range checks belong to the
/// engine.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QartConfig {
    /// Text to encode (typically a URL)
    pub payload: String,
    /// QR version (0 = smallest that fits)
    pub version: i32,
    /// Mask pattern selector
    pub mask: i32,
    /// Output pixels per module
    pub scale: i32,
    /// Quarter turns clockwise
    pub rotation: i32,
    /// Randomize free pixels instead of keeping them deterministic
    #[serde(rename = "rand")]
    pub randomize: bool,
    /// Dither the reference image before matching
    pub dither: bool,
    /// Only alter pixels that belong to data modules
    pub only_data_bits: bool,
    /// Also produce the function-pattern control image
    pub save_control: bool,
    /// Reference image brightness offset
    pub brightness: i32,
    /// Reference image contrast, in percent
    pub contrast: i32,
    /// Raw bytes of the reference (halftone) image
    #[serde(skip)]
    pub reference_image: Option<Vec<u8>>,
}

impl QartConfig {
    /// Create a config for `payload` with every option at its zero value.
    pub fn new(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            ..Self::default()
        }
    }

    /// Check whether a reference image will be passed to the engine
    pub fn has_reference_image(&self) -> bool {
        self.reference_image.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_zero_values() {
        let config = QartConfig::new("https://example.com");
        assert_eq!(config.payload, "https://example.com");
        assert_eq!(config.version, 0);
        assert_eq!(config.scale, 0);
        assert!(!config.randomize);
        assert!(!config.has_reference_image());
    }

    #[test]
    fn test_config_reference_image() {
        let mut config = QartConfig::new("x");
        config.reference_image = Some(vec![1, 2, 3]);
        assert!(config.has_reference_image());
    }
}
