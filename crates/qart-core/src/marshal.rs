//! Argument marshaling.
//!
//! Converts the positional arguments of a `generateQart` call into a
//! [`QartConfig`]. The marshaler only checks the shape of the call: it needs a
//! payload and an option bag, and a bag-supplied reference image must be
//! valid base64. Every option field is read with a total coercion, so a
//! missing or oddly-typed field resolves to its zero value instead of failing.
//! Range checks are left to the engine.
//!
//! # Reference image precedence
//!
//! `options.halftoneBase64` is applied first and a third positional byte
//! argument second. When both are present, the positional bytes win.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

use crate::value::Value;
use crate::QartConfig;

/// Option key for the QR version.
pub const KEY_VERSION: &str = "version";
/// Option key for the mask pattern.
pub const KEY_MASK: &str = "mask";
/// Option key for the pixel scale.
pub const KEY_SCALE: &str = "scale";
/// Option key for the rotation.
pub const KEY_ROTATION: &str = "rotation";
/// Option key for free-pixel randomization.
pub const KEY_RAND: &str = "rand";
/// Option key for reference dithering.
pub const KEY_DITHER: &str = "dither";
/// Option key for restricting changes to data modules.
pub const KEY_ONLY_DATA_BITS: &str = "onlyDataBits";
/// Option key for the control image.
pub const KEY_SAVE_CONTROL: &str = "saveControl";
/// Option key for reference brightness.
pub const KEY_BRIGHTNESS: &str = "brightness";
/// Option key for reference contrast.
pub const KEY_CONTRAST: &str = "contrast";
/// Option key for a base64 reference image.
pub const KEY_HALFTONE_BASE64: &str = "halftoneBase64";

/// Every option key the marshaler reads.
pub const OPTION_KEYS: [&str; 11] = [
    KEY_VERSION,
    KEY_MASK,
    KEY_SCALE,
    KEY_ROTATION,
    KEY_RAND,
    KEY_DITHER,
    KEY_ONLY_DATA_BITS,
    KEY_SAVE_CONTROL,
    KEY_BRIGHTNESS,
    KEY_CONTRAST,
    KEY_HALFTONE_BASE64,
];

/// Number of positional arguments a call must supply.
pub const REQUIRED_ARGS: usize = 2;

/// Errors produced while marshaling call arguments.
#[derive(Debug, Error, PartialEq)]
pub enum MarshalError {
    /// Fewer than the required positional arguments were supplied.
    #[error("missing arguments: need url, options[, halftoneBytes], got {got}")]
    MissingArguments { got: usize },

    /// `halftoneBase64` is not valid standard base64.
    #[error("invalid base64 in halftoneBase64: {0}")]
    InvalidReferenceEncoding(String),
}

/// Build a [`QartConfig`] from positional call arguments.
///
/// Expects `[payload, options, halftoneBytes?]`. Nothing past the argument
/// count check runs when fewer than two arguments are given.
pub fn marshal(args: &[Value]) -> Result<QartConfig, MarshalError> {
    if args.len() < REQUIRED_ARGS {
        return Err(MarshalError::MissingArguments { got: args.len() });
    }

    let options = &args[1];
    let mut config = QartConfig {
        payload: args[0].to_text(),
        version: options.field(KEY_VERSION).to_int(),
        mask: options.field(KEY_MASK).to_int(),
        scale: options.field(KEY_SCALE).to_int(),
        rotation: options.field(KEY_ROTATION).to_int(),
        randomize: options.field(KEY_RAND).truthy(),
        dither: options.field(KEY_DITHER).truthy(),
        only_data_bits: options.field(KEY_ONLY_DATA_BITS).truthy(),
        save_control: options.field(KEY_SAVE_CONTROL).truthy(),
        brightness: options.field(KEY_BRIGHTNESS).to_int(),
        contrast: options.field(KEY_CONTRAST).to_int(),
        reference_image: None,
    };

    let halftone = options.field(KEY_HALFTONE_BASE64);
    if halftone.truthy() {
        let decoded = STANDARD
            .decode(halftone.to_text())
            .map_err(|e| MarshalError::InvalidReferenceEncoding(e.to_string()))?;
        config.reference_image = Some(decoded);
    }

    match args.get(2) {
        Some(Value::Bytes(bytes)) => config.reference_image = Some(bytes.clone()),
        Some(other) if !other.is_absent() => {
            log::warn!("[QART] ignoring non-binary halftone argument: {other}");
        }
        _ => {}
    }

    Ok(config)
}
