//! Persisted-text boundary for record documents.
//!
//! Patient records and doctor profiles are stored as JSON text. Reads are forgiving: text that
//! cannot be parsed becomes an empty object and a warning is logged, so a corrupted row never
//! takes a read path down. Typed documents are decoded through [`decode`], which layers the
//! template defaults on top of whatever survived.

use crate::{TrackerError, TrackerResult};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

/// Parse persisted text into a JSON object.
///
/// Malformed input, or valid JSON that is not an object, yields an empty object.
pub fn parse(text: &str) -> Value {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            tracing::warn!(kind = json_kind(&other), "stored document is not an object");
            Value::Object(Map::new())
        }
        Err(e) => {
            tracing::warn!("failed to parse stored document: {e}");
            Value::Object(Map::new())
        }
    }
}

/// Canonical compact text form of a document.
pub fn serialize(document: &Value) -> String {
    document.to_string()
}

/// Decode persisted text into a typed document, falling back to its defaults.
pub fn decode<T>(text: &str) -> T
where
    T: DeserializeOwned + Default,
{
    from_value(parse(text))
}

/// Decode an in-memory JSON value into a typed document, falling back to its defaults.
pub fn from_value<T>(value: Value) -> T
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_value(value) {
        Ok(document) => document,
        Err(e) => {
            tracing::warn!(
                document = std::any::type_name::<T>(),
                "document structure unusable, using template: {e}"
            );
            T::default()
        }
    }
}

/// Encode a typed document into its persisted text.
pub fn encode<T: Serialize>(document: &T) -> TrackerResult<String> {
    serde_json::to_string(document).map_err(TrackerError::Serialization)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Permissive field readers for `#[serde(deserialize_with = "...")]`.
///
/// Clients and older rows store leaves loosely: numbers as strings, ids as either, sections as
/// `null`. These readers accept any JSON value and coerce it, so a single odd leaf never
/// discards the whole document.
pub mod lenient {
    use serde::{de::DeserializeOwned, Deserialize, Deserializer};
    use serde_json::Value;

    /// Text from any scalar. `null` becomes the empty string.
    pub fn string<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(as_text(Value::deserialize(deserializer)?))
    }

    pub fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Null => None,
            other => Some(as_text(other)),
        })
    }

    /// Relational id from a number or a numeric string.
    pub fn opt_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(id_of(&Value::deserialize(deserializer)?))
    }

    pub fn float<'de, D>(deserializer: D) -> Result<f64, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(float_of(&Value::deserialize(deserializer)?).unwrap_or(0.0))
    }

    pub fn opt_float<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(float_of(&Value::deserialize(deserializer)?))
    }

    /// Non-negative counter. Anything unreadable counts as zero.
    pub fn count<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(match value {
            Value::Number(n) => n
                .as_u64()
                .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0),
            Value::String(s) => s.trim().parse().unwrap_or(0),
            _ => 0,
        })
    }

    /// List of typed elements. A non-array is an empty list; unreadable elements are dropped.
    pub fn seq<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned,
    {
        let Value::Array(items) = Value::deserialize(deserializer)? else {
            return Ok(Vec::new());
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("dropping unreadable list element: {e}");
                    None
                }
            })
            .collect())
    }

    /// Raw JSON list. A non-array is an empty list.
    pub fn values<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Value::deserialize(deserializer)? {
            Value::Array(items) => items,
            _ => Vec::new(),
        })
    }

    /// Typed section that falls back to its defaults when the stored value does not fit.
    pub fn section<'de, D, T>(deserializer: D) -> Result<T, D::Error>
    where
        D: Deserializer<'de>,
        T: DeserializeOwned + Default,
    {
        let value = Value::deserialize(deserializer)?;
        if !value.is_object() {
            return Ok(T::default());
        }
        Ok(super::from_value(value))
    }

    pub(crate) fn as_text(value: Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            composite => composite.to_string(),
        }
    }

    pub(crate) fn id_of(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64().or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.is_finite())
                    .map(|f| f as i64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub(crate) fn float_of(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok().filter(|f: &f64| f.is_finite()),
            _ => None,
        }
    }
}
