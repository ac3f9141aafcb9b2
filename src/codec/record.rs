//! Structured records
//!
//! A record is a flat set of named fields. The canonical encoding is a
//! compact JSON object with fields sorted by name, so two records with the
//! same field values always produce the same bytes.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as Json;

use crate::error::{MapError, Result};

/// Field name to field value, as held by [`Value::Record`](super::Value::Record)
pub type RecordFields = serde_json::Map<String, Json>;

/// Marker for types stored as structured records
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use atlasmap::codec::Record;
///
/// #[derive(Serialize, Deserialize)]
/// struct Point {
///     x: i64,
///     y: f64,
/// }
///
/// impl Record for Point {}
/// ```
pub trait Record: Serialize + DeserializeOwned {}

pub(super) fn encode_fields(fields: &RecordFields) -> Result<Vec<u8>> {
    if let Some(name) = first_nested_field(fields) {
        return Err(MapError::encode(format!(
            "record field {:?} is not a primitive value",
            name
        )));
    }

    let ordered: BTreeMap<&str, &Json> = fields.iter().map(|(k, v)| (k.as_str(), v)).collect();
    serde_json::to_vec(&ordered).map_err(|e| MapError::encode(e.to_string()))
}

pub(super) fn decode_fields(bytes: &[u8]) -> Result<RecordFields> {
    let fields = match serde_json::from_slice::<Json>(bytes) {
        Ok(Json::Object(fields)) => fields,
        Ok(other) => {
            return Err(MapError::decode(format!(
                "record must be an object, got {}",
                json_type(&other)
            )))
        }
        Err(e) => return Err(MapError::decode(format!("malformed record: {}", e))),
    };

    if let Some(name) = first_nested_field(&fields) {
        return Err(MapError::decode(format!(
            "record field {:?} is not a primitive value",
            name
        )));
    }
    Ok(fields)
}

/// Serialize a record type into its field map
pub(super) fn to_fields<T: Record>(record: &T) -> Result<RecordFields> {
    match serde_json::to_value(record) {
        Ok(Json::Object(fields)) => Ok(fields),
        Ok(other) => Err(MapError::encode(format!(
            "record must serialize to an object, got {}",
            json_type(&other)
        ))),
        Err(e) => Err(MapError::encode(e.to_string())),
    }
}

/// Rebuild a record type from its field map
pub(super) fn from_fields<T: Record>(fields: RecordFields) -> Result<T> {
    serde_json::from_value(Json::Object(fields))
        .map_err(|e| MapError::decode(format!("record schema mismatch: {}", e)))
}

fn first_nested_field(fields: &RecordFields) -> Option<&str> {
    fields
        .iter()
        .find(|(_, value)| !is_leaf(value))
        .map(|(name, _)| name.as_str())
}

/// Primitive leaves plus byte arrays
fn is_leaf(value: &Json) -> bool {
    match value {
        Json::Null | Json::Bool(_) | Json::Number(_) | Json::String(_) => true,
        Json::Array(items) => items
            .iter()
            .all(|item| item.as_u64().is_some_and(|b| b <= u8::MAX as u64)),
        Json::Object(_) => false,
    }
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "bool",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
