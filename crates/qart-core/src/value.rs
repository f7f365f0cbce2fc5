//! Loosely-typed call values.
//!
//! Arguments crossing the JavaScript boundary carry no static types: a number
//! may arrive as a string, a flag as `1` or `"yes"`. [`Value`] captures what
//! actually arrived, and its coercions resolve every value to a defined result
//! using JavaScript's own conversion rules. None of the coercions can fail.

use std::collections::BTreeMap;
use std::fmt;

/// A named set of loosely-typed options.
pub type OptionBag = BTreeMap<String, Value>;

static UNDEFINED: Value = Value::Undefined;

/// A single loosely-typed value received from the host.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// The argument or field was not supplied.
    #[default]
    Undefined,
    /// An explicit `null`.
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Raw bytes (`Uint8Array`, `ArrayBuffer`).
    Bytes(Vec<u8>),
    /// A plain object, reduced to the keys the bridge reads.
    Bag(OptionBag),
    /// Anything else (functions, symbols, class instances).
    Opaque,
}

impl Value {
    /// Build a bag from `(key, value)` pairs.
    pub fn bag<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Bag(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Look up a field of a bag.
    ///
    /// Missing keys, and lookups on anything that is not a bag, read as
    /// [`Value::Undefined`].
    pub fn field(&self, key: &str) -> &Value {
        match self {
            Value::Bag(bag) => bag.get(key).unwrap_or(&UNDEFINED),
            _ => &UNDEFINED,
        }
    }

    /// `true` for `undefined` and `null`.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    /// JavaScript truthiness.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::Text(s) => !s.is_empty(),
            Value::Bytes(_) | Value::Bag(_) | Value::Opaque => true,
        }
    }

    /// Coerce to an integer the way `Number(v) | 0`-style host code would,
    /// but saturating instead of wrapping.
    ///
    /// Fractions truncate toward zero and NaN becomes 0.
    pub fn to_int(&self) -> i32 {
        self.to_number() as i32
    }

    /// Coerce to a number. Values with no numeric reading yield 0.
    pub fn to_number(&self) -> f64 {
        let n = match self {
            Value::Number(n) => *n,
            Value::Bool(true) => 1.0,
            Value::Text(s) => parse_number(s),
            _ => 0.0,
        };
        if n.is_nan() {
            0.0
        } else {
            n
        }
    }

    /// Coerce to text following `String(v)`.
    pub fn to_text(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn parse_number(s: &str) -> f64 {
    let s = s.trim();
    if s.is_empty() {
        return 0.0;
    }
    match s {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => {
            if let Some(n) = parse_radix_literal(s) {
                return n;
            }
            // Rust accepts spellings JavaScript does not.
            if s.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
                return 0.0;
            }
            s.parse().unwrap_or(0.0)
        }
    }
}

/// `0x`, `0o` and `0b` literals. Unsigned only, as in `Number("0x10")`.
fn parse_radix_literal(s: &str) -> Option<f64> {
    let radix = match s.get(..2)? {
        "0x" | "0X" => 16,
        "0o" | "0O" => 8,
        "0b" | "0B" => 2,
        _ => return None,
    };
    let digits = &s[2..];
    if digits.is_empty() {
        return Some(0.0);
    }
    let n = digits.chars().try_fold(0.0f64, |n, c| {
        c.to_digit(radix).map(|d| n * f64::from(radix) + f64::from(d))
    });
    Some(n.unwrap_or(0.0))
}

/// `Number.prototype.toString()`: exponent notation outside `[1e-6, 1e21)`.
fn fmt_number(n: f64, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let magnitude = n.abs();
    if magnitude == 0.0 || (1e-6..1e21).contains(&magnitude) {
        return write!(f, "{}", if n == 0.0 { 0.0 } else { n });
    }
    let exp = format!("{n:e}");
    match exp.split_once('e') {
        Some((mantissa, power)) if !power.starts_with('-') => write!(f, "{mantissa}e+{power}"),
        _ => f.write_str(&exp),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Number(n) if n.is_nan() => f.write_str("NaN"),
            Value::Number(n) if n.is_infinite() => {
                f.write_str(if *n > 0.0 { "Infinity" } else { "-Infinity" })
            }
            Value::Number(n) => fmt_number(*n, f),
            Value::Text(s) => f.write_str(s),
            Value::Bytes(bytes) => write!(f, "[{} bytes]", bytes.len()),
            Value::Bag(_) => f.write_str("[object Object]"),
            Value::Opaque => f.write_str("[opaque]"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Number(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_int_numbers() {
        assert_eq!(Value::from(4).to_int(), 4);
        assert_eq!(Value::from(4.9).to_int(), 4);
        assert_eq!(Value::from(-4.9).to_int(), -4);
        assert_eq!(Value::from(f64::NAN).to_int(), 0);
        assert_eq!(Value::from(1e12).to_int(), i32::MAX);
        assert_eq!(Value::from(f64::NEG_INFINITY).to_int(), i32::MIN);
    }

    #[test]
    fn test_to_int_other_kinds() {
        assert_eq!(Value::Bool(true).to_int(), 1);
        assert_eq!(Value::Bool(false).to_int(), 0);
        assert_eq!(Value::from(" 7 ").to_int(), 7);
        assert_eq!(Value::from("2.5").to_int(), 2);
        assert_eq!(Value::from("").to_int(), 0);
        assert_eq!(Value::from("seven").to_int(), 0);
        assert_eq!(Value::from("nan").to_int(), 0);
        assert_eq!(Value::from("0x10").to_int(), 16);
        assert_eq!(Value::from(" 0b101 ").to_int(), 5);
        assert_eq!(Value::from("0o17").to_int(), 15);
        assert_eq!(Value::from("0xg").to_int(), 0);
        assert_eq!(Value::from("-0x10").to_int(), 0);
        assert_eq!(Value::Undefined.to_int(), 0);
        assert_eq!(Value::Null.to_int(), 0);
        assert_eq!(Value::Opaque.to_int(), 0);
        assert_eq!(Value::Bytes(vec![1, 2]).to_int(), 0);
    }

    #[test]
    fn test_truthy() {
        assert!(!Value::Undefined.truthy());
        assert!(!Value::Null.truthy());
        assert!(!Value::Bool(false).truthy());
        assert!(!Value::from(0).truthy());
        assert!(!Value::from(f64::NAN).truthy());
        assert!(!Value::from("").truthy());

        assert!(Value::Bool(true).truthy());
        assert!(Value::from(-1).truthy());
        assert!(Value::from("false").truthy());
        assert!(Value::Bytes(vec![]).truthy());
        assert!(Value::bag(Vec::<(String, Value)>::new()).truthy());
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::from("https://example.com").to_text(), "https://example.com");
        assert_eq!(Value::from(42).to_text(), "42");
        assert_eq!(Value::from(1.5).to_text(), "1.5");
        assert_eq!(Value::from(f64::INFINITY).to_text(), "Infinity");
        assert_eq!(Value::from(1e21).to_text(), "1e+21");
        assert_eq!(Value::from(-2.5e30).to_text(), "-2.5e+30");
        assert_eq!(Value::from(1e20).to_text(), "100000000000000000000");
        assert_eq!(Value::from(1.5e-7).to_text(), "1.5e-7");
        assert_eq!(Value::from(0.000001).to_text(), "0.000001");
        assert_eq!(Value::from(-0.0).to_text(), "0");
        assert_eq!(Value::Bool(true).to_text(), "true");
        assert_eq!(Value::Undefined.to_text(), "undefined");
        assert_eq!(Value::Null.to_text(), "null");
    }

    #[test]
    fn test_field_lookup() {
        let bag = Value::bag([("scale", Value::from(4))]);
        assert_eq!(bag.field("scale"), &Value::from(4));
        assert_eq!(bag.field("mask"), &Value::Undefined);
        assert_eq!(Value::from(3).field("scale"), &Value::Undefined);
    }
}
