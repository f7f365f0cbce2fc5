//! The `generateQart` entry point.
//!
//! # Example
//!
//! ```typescript
//! import init from '@qart/wasm';
//!
//! await init(); // also installs globalThis.generateQart
//!
//! const result = generateQart('https://example.com', { scale: 4, halftoneBase64 });
//! if (typeof result === 'string') {
//!   console.error(result);             // "error: ..."
//! } else {
//!   img.src = `data:image/png;base64,${result.base64EncodedImage}`;
//! }
//! ```

use qart_core::{generate, Envelope, HalftoneEngine, Value};
use wasm_bindgen::prelude::*;

use crate::convert::{call_args, counted_args};

/// Generate a halftone QR code.
///
/// # Arguments
///
/// * `payload` - Text to encode
/// * `options` - Option bag (`version`, `mask`, `scale`, `rotation`, `rand`,
///   `dither`, `onlyDataBits`, `saveControl`, `brightness`, `contrast`,
///   `halftoneBase64`)
/// * `halftone_bytes` - Optional reference image as a `Uint8Array`; replaces
///   `options.halftoneBase64` when both are given
///
/// # Returns
///
/// `{ success: true, base64EncodedImage }` on success, otherwise a single
/// string starting with `error:`. Never throws.
#[wasm_bindgen(js_name = generateQart)]
pub fn generate_qart(payload: JsValue, options: JsValue, halftone_bytes: JsValue) -> JsValue {
    run(call_args(&[payload, options, halftone_bytes]))
}

/// Entry behind `globalThis.generateQart`, which forwards `arguments.length`.
pub(crate) fn generate_qart_counted(
    supplied: u32,
    payload: JsValue,
    options: JsValue,
    halftone_bytes: JsValue,
) -> JsValue {
    run(counted_args(supplied, &[payload, options, halftone_bytes]))
}

fn run(args: Vec<Value>) -> JsValue {
    match generate(&HalftoneEngine::new(), &args) {
        Ok(envelope) => envelope_to_js(&envelope),
        Err(err) => JsValue::from_str(&err.to_string()),
    }
}

fn envelope_to_js(envelope: &Envelope) -> JsValue {
    serde_wasm_bindgen::to_value(envelope).unwrap_or_else(|e| {
        log::error!("[QART] failed to build result object: {e}");
        JsValue::from_str(&format!("error: {e}"))
    })
}
