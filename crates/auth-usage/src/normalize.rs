//! Canonical dimension keys from loosely typed field values.
//!
//! Upstream payloads mix representations of the same credential
//! (`auth_index: 3` next to `auth_index: "3"`). Every key passes through
//! here before it is counted or looked up so both land in one bucket.

use serde_json::Value;

/// A borrowed, loosely typed key value as found in a payload or passed by a
/// caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawKey<'a> {
    /// A JSON number or Rust numeric.
    Number(f64),
    /// An exact integer, kept apart from `Number` so large values print exactly.
    Integer(i128),
    /// A string, not yet trimmed.
    Text(&'a str),
    /// Anything else: null, missing, booleans, arrays, objects.
    Other,
}

impl<'a> From<&'a str> for RawKey<'a> {
    fn from(value: &'a str) -> Self {
        RawKey::Text(value)
    }
}

impl<'a> From<&'a String> for RawKey<'a> {
    fn from(value: &'a String) -> Self {
        RawKey::Text(value.as_str())
    }
}

impl From<f64> for RawKey<'_> {
    fn from(value: f64) -> Self {
        RawKey::Number(value)
    }
}

macro_rules! raw_key_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for RawKey<'_> {
                fn from(value: $t) -> Self {
                    RawKey::Integer(value as i128)
                }
            }
        )*
    };
}

raw_key_from_int!(i32, i64, u32, u64, usize);

impl<'a> From<&'a Value> for RawKey<'a> {
    fn from(value: &'a Value) -> Self {
        match value {
            Value::String(s) => RawKey::Text(s),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    RawKey::Integer(i as i128)
                } else if let Some(u) = n.as_u64() {
                    RawKey::Integer(u as i128)
                } else {
                    n.as_f64().map(RawKey::Number).unwrap_or(RawKey::Other)
                }
            }
            _ => RawKey::Other,
        }
    }
}

impl<'a, T: Into<RawKey<'a>>> From<Option<T>> for RawKey<'a> {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(RawKey::Other)
    }
}

/// Canonical credential-index key.
///
/// Finite numbers are stringified; strings are trimmed and rejected when
/// empty. Everything else has no key.
pub fn normalize_index_key<'a>(value: impl Into<RawKey<'a>>) -> Option<String> {
    match value.into() {
        RawKey::Integer(i) => Some(i.to_string()),
        RawKey::Number(n) if n.is_finite() => Some(format_number(n)),
        RawKey::Text(s) => trimmed(s),
        _ => None,
    }
}

/// Canonical credential-identifier key. Only strings qualify.
pub fn normalize_id_key<'a>(value: impl Into<RawKey<'a>>) -> Option<String> {
    match value.into() {
        RawKey::Text(s) => trimmed(s),
        _ => None,
    }
}

fn trimmed(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// Integral floats print without a fraction, so `3.0` and `3` share a key.
fn format_number(n: f64) -> String {
    if n == 0.0 {
        // covers -0.0
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// Drop a trailing `.ext` from a source name.
///
/// Only the last segment is removed, and only when it is non-empty and holds
/// no path separator. Returns `None` when there is nothing to strip.
pub fn strip_extension(name: &str) -> Option<&str> {
    let dot = name.rfind('.')?;
    let ext = &name[dot + 1..];
    if ext.is_empty() || ext.contains('/') {
        return None;
    }
    Some(&name[..dot])
}
