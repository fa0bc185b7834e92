//! Record types persisted by the store, plus the typing step that turns
//! validated model output into those records.

pub mod candidate;
pub mod job;
pub mod job_match;

use serde::de::{DeserializeOwned, Deserializer, Error as _};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::errors::AppError;

/// Reads one field of a decoded model response as `T`, naming the field on
/// failure. An absent key reads as `null`.
pub(crate) fn typed_field<T: DeserializeOwned>(
    output: &Map<String, Value>,
    key: &str,
) -> Result<T, AppError> {
    let value = output.get(key).cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map_err(|e| AppError::InvalidRecord(format!("{key}: {e}")))
}

/// Accepts a string, number or null where free text is expected.
/// Models often answer `"year": 2020` instead of `"2020"`.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        Value::Bool(_) => Err(D::Error::custom("expected text, found a boolean")),
        Value::Array(_) => Err(D::Error::custom("expected text, found an array")),
        Value::Object(_) => Err(D::Error::custom("expected text, found an object")),
    }
}
