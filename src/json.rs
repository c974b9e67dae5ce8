//! Loose readings of JSON values from upstream bodies.
//!
//! Neither the provider nor the endpoint promises field types, so values
//! are read the way a browser client would read them: by truthiness, with
//! scalars coerced where that makes sense.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// False for `null`, `false`, `0` and `""`; true for everything else.
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::Bool(b) => *b,
    Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
    Value::String(s) => !s.is_empty(),
    Value::Array(_) | Value::Object(_) => true,
  }
}

/// Strings as-is, numbers and booleans in their JSON spelling.
#[must_use]
pub fn as_text(value: Value) -> Option<String> {
  match value {
    Value::String(s) => Some(s),
    Value::Number(n) => Some(n.to_string()),
    Value::Bool(b) => Some(b.to_string()),
    Value::Null | Value::Array(_) | Value::Object(_) => None,
  }
}

/// Numbers, or strings that parse as one.
#[must_use]
pub fn as_number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => s.trim().parse().ok(),
    _ => None,
  }
}

/// Reads text. Numbers and booleans keep their JSON spelling, other values
/// come out as `None`.
///
/// # Errors
///
/// Only if the input is not JSON at all.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  Value::deserialize(deserializer).map(as_text)
}

/// Reads a number, or a string holding one.
///
/// # Errors
///
/// Only if the input is not JSON at all.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
  D: Deserializer<'de>,
{
  Value::deserialize(deserializer).map(|v| as_number(&v))
}

/// Like [`lenient_number`], truncated to an integer.
///
/// # Errors
///
/// Only if the input is not JSON at all.
#[allow(clippy::cast_possible_truncation)]
pub fn lenient_integer<'de, D>(
  deserializer: D,
) -> Result<Option<i64>, D::Error>
where
  D: Deserializer<'de>,
{
  Value::deserialize(deserializer).map(|v| {
    v.as_i64()
      .or_else(|| as_number(&v).filter(|f| f.is_finite()).map(|f| f as i64))
  })
}

/// Reads any value by truthiness.
///
/// # Errors
///
/// Only if the input is not JSON at all.
pub fn lenient_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
  D: Deserializer<'de>,
{
  Value::deserialize(deserializer).map(|v| Some(is_truthy(&v)))
}
