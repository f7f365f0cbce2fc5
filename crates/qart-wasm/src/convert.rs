//! Conversion from JavaScript values to core call values.
//!
//! Every `JsValue` maps to exactly one [`Value`]; nothing here fails. Plain
//! objects are reduced to the option keys the marshaler reads, which keeps a
//! caller's unrelated (or throwing) properties out of the picture.

use js_sys::{ArrayBuffer, Reflect, Uint8Array, Uint8ClampedArray};
use qart_core::marshal::OPTION_KEYS;
use qart_core::{OptionBag, Value};
use wasm_bindgen::{JsCast, JsValue};

/// Convert one JavaScript value.
pub(crate) fn to_value(js: &JsValue) -> Value {
    if js.is_undefined() {
        Value::Undefined
    } else if js.is_null() {
        Value::Null
    } else if let Some(b) = js.as_bool() {
        Value::Bool(b)
    } else if let Some(n) = js.as_f64() {
        Value::Number(n)
    } else if let Some(s) = js.as_string() {
        Value::Text(s)
    } else if let Some(bytes) = js.dyn_ref::<Uint8Array>() {
        Value::Bytes(bytes.to_vec())
    } else if let Some(bytes) = js.dyn_ref::<Uint8ClampedArray>() {
        Value::Bytes(bytes.to_vec())
    } else if let Some(buffer) = js.dyn_ref::<ArrayBuffer>() {
        Value::Bytes(Uint8Array::new(buffer).to_vec())
    } else if js.is_object() && !js.is_function() {
        Value::Bag(to_bag(js))
    } else {
        Value::Opaque
    }
}

/// Read the recognized option keys off an object.
///
/// A getter that throws reads as `undefined`.
fn to_bag(js: &JsValue) -> OptionBag {
    OPTION_KEYS
        .iter()
        .filter_map(|&key| {
            let field = Reflect::get(js, &JsValue::from_str(key)).ok()?;
            if field.is_undefined() {
                return None;
            }
            // One level deep is all the marshaler needs
            let value = if field.is_object() && !is_binary(&field) {
                Value::Opaque
            } else {
                to_value(&field)
            };
            Some((key.to_string(), value))
        })
        .collect()
}

fn is_binary(js: &JsValue) -> bool {
    js.is_instance_of::<Uint8Array>()
        || js.is_instance_of::<Uint8ClampedArray>()
        || js.is_instance_of::<ArrayBuffer>()
}

/// Build the positional argument list of a call.
pub(crate) fn call_args(args: &[JsValue]) -> Vec<Value> {
    trim_unsupplied(args.iter().map(to_value).collect())
}

/// Build the argument list of a call whose `arguments.length` is known.
///
/// Every supplied argument counts, explicit `undefined` included.
pub(crate) fn counted_args(supplied: u32, args: &[JsValue]) -> Vec<Value> {
    let supplied = usize::try_from(supplied).unwrap_or(usize::MAX);
    args.iter().take(supplied).map(to_value).collect()
}

/// Module exports receive `undefined` for arguments the caller left out and
/// cannot see `arguments.length`, so trailing `undefined`s count as not
/// supplied.
pub(crate) fn trim_unsupplied(mut args: Vec<Value>) -> Vec<Value> {
    while matches!(args.last(), Some(Value::Undefined)) {
        args.pop();
    }
    args
}
