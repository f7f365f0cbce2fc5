//! Qart WASM - WebAssembly bindings for the qart bridge
//!
//! This crate exposes `generateQart` to JavaScript. Loading the module
//! registers the function on the global object once, so pages that expect a
//! global `generateQart` work without importing it.
//!
//! # Module Structure
//!
//! - `convert` - `JsValue` to core value conversion
//! - `generate` - The `generateQart` entry point
//! - `console` - `log` backend for the browser console
//!
//! # Usage
//!
//! ```typescript
//! import init, { generateQart } from '@qart/wasm';
//!
//! // Initialize WASM module (must call first)
//! await init();
//!
//! const bytes = new Uint8Array(await file.arrayBuffer());
//! const result = generateQart('https://example.com', { scale: 6, dither: true }, bytes);
//! ```

use std::sync::Once;

use wasm_bindgen::prelude::*;

mod console;
mod convert;
mod generate;

pub use generate::generate_qart;

use generate::generate_qart_counted;

/// Name of the entry point on the JavaScript global object.
pub const GLOBAL_NAME: &str = "generateQart";

static REGISTER: Once = Once::new();

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    console::init(console::default_level());
    REGISTER.call_once(register_global);
}

/// Source of the global wrapper. Rust closures cannot see
/// `arguments.length`, so the wrapper passes it along.
const WRAPPER_SOURCE: &str = "return function generateQart(payload, options, halftone) { \
    return entry(arguments.length, payload, options, halftone); \
};";

type CountedEntry = dyn Fn(u32, JsValue, JsValue, JsValue) -> JsValue;

/// Install `globalThis.generateQart`. The closure lives until the page goes
/// away.
fn register_global() {
    let entry = Closure::<CountedEntry>::new(generate_qart_counted);
    let result = wrap_entry(&entry).and_then(|wrapper| {
        js_sys::Reflect::set(&js_sys::global(), &JsValue::from_str(GLOBAL_NAME), &wrapper)
    });

    match result {
        Ok(_) => log::info!("qart.wasm loaded"),
        Err(e) => log::error!("[QART] failed to register {GLOBAL_NAME}: {e:?}"),
    }
    entry.forget();
}

fn wrap_entry(entry: &Closure<CountedEntry>) -> Result<JsValue, JsValue> {
    let factory = js_sys::Function::new_with_args("entry", WRAPPER_SOURCE);
    factory.call1(&JsValue::UNDEFINED, entry.as_ref())
}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
