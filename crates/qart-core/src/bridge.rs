//! Engine invocation and result packaging.
//!
//! A call runs `marshal -> encode -> base64` exactly once and ends in either
//! an [`Envelope`] or a [`BridgeError`]. Nothing is retried and no state
//! outlives the call. Every failure is logged before it is returned; its
//! `Display` text is what the host receives.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::Serialize;
use thiserror::Error;

use crate::engine::Engine;
use crate::marshal::{marshal, MarshalError};
use crate::value::Value;
use crate::QartConfig;

/// Successful call result, serialized as
/// `{ "success": true, "base64EncodedImage": "..." }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    /// Always `true`
    pub success: bool,
    /// Standard base64 (with padding) of the PNG bytes
    pub base64_encoded_image: String,
}

impl Envelope {
    /// Wrap raw image bytes.
    pub fn new(image: &[u8]) -> Self {
        Self {
            success: true,
            base64_encoded_image: STANDARD.encode(image),
        }
    }
}

/// Terminal failure of a bridge call.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// Fewer than two positional arguments.
    #[error("error: missing arguments")]
    MissingArguments,

    /// `halftoneBase64` could not be decoded. Carries the decoder's detail.
    #[error("error: invalid base64 in halftoneBase64")]
    InvalidReferenceEncoding(String),

    /// The engine rejected the request; the detail is the engine's own text.
    #[error("error: {0}")]
    EngineEncodeFailed(String),
}

impl From<MarshalError> for BridgeError {
    fn from(err: MarshalError) -> Self {
        match err {
            MarshalError::MissingArguments { .. } => BridgeError::MissingArguments,
            MarshalError::InvalidReferenceEncoding(detail) => {
                BridgeError::InvalidReferenceEncoding(detail)
            }
        }
    }
}

/// Run one full call: marshal `args`, invoke `engine`, package the result.
///
/// The engine is not touched when marshaling fails.
pub fn generate<E: Engine + ?Sized>(engine: &E, args: &[Value]) -> Result<Envelope, BridgeError> {
    let config = marshal(args).map_err(|e| {
        log::error!("[QART] error: {e}");
        BridgeError::from(e)
    })?;
    package(engine, &config)
}

/// Invoke `engine` once with `config` and wrap its output.
pub fn package<E: Engine + ?Sized>(
    engine: &E,
    config: &QartConfig,
) -> Result<Envelope, BridgeError> {
    log::debug!(
        "[QART] encoding {} chars (version {}, mask {}, scale {}, reference image: {})",
        config.payload.chars().count(),
        config.version,
        config.mask,
        config.scale,
        config.has_reference_image()
    );

    let encoded = engine.encode(config).map_err(|e| {
        log::error!("[QART] Encode error: {e}");
        BridgeError::EngineEncodeFailed(e.to_string())
    })?;

    if encoded.png.is_empty() {
        log::error!("[QART] Encode error: engine returned no image bytes");
        return Err(BridgeError::EngineEncodeFailed(
            "engine returned no image bytes".to_string(),
        ));
    }
    if let Some(control) = &encoded.control_png {
        log::debug!("[QART] control image produced ({} bytes)", control.len());
    }

    log::debug!("[QART] encoded {} bytes", encoded.png.len());
    Ok(Envelope::new(&encoded.png))
}
