//! Codec Module
//!
//! Converts supported values to and from their canonical byte form.
//!
//! ## Canonical Byte Representation
//! ```text
//! ┌──────────┬──────────────────────────────────────────────────┐
//! │ Kind     │ Bytes                                            │
//! ├──────────┼──────────────────────────────────────────────────┤
//! │ Record   │ compact JSON object, fields sorted by name       │
//! │ Bytes    │ passed through unchanged                         │
//! │ Text     │ UTF-8                                            │
//! │ Int      │ base-10 ASCII digits, leading '-' for negatives  │
//! │ Float    │ 8 bytes, IEEE-754 binary64, little-endian        │
//! └──────────┴──────────────────────────────────────────────────┘
//! ```
//!
//! Integers are stored as text rather than fixed-width binary so that fields
//! stay readable from store inspection tools (`atlasmap-cli keys`).
//!
//! Bytes carry no type tag. Decoding with a kind other than the one that
//! wrote them is undefined: it may fail, or it may succeed with a different
//! value (`Int(12)` and `Text("12")` share a representation).

mod record;
mod storable;

pub use record::{Record, RecordFields};
pub use storable::Storable;

use bytes::Bytes;

use crate::error::{MapError, Result};

/// Width of an encoded float
pub const FLOAT_WIDTH: usize = 8;

/// Type descriptor selecting a decode path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Record,
    Bytes,
    Text,
    Int,
    Float,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Record => "record",
            Kind::Bytes => "bytes",
            Kind::Text => "text",
            Kind::Int => "int",
            Kind::Float => "float",
        }
    }
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A supported value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Flat structured record
    Record(RecordFields),

    /// Raw byte sequence
    Bytes(Bytes),

    /// UTF-8 text
    Text(String),

    /// Signed integer
    Int(i64),

    /// Double-precision float
    Float(f64),
}

impl Value {
    /// The kind of this value
    pub fn kind(&self) -> Kind {
        match self {
            Value::Record(_) => Kind::Record,
            Value::Bytes(_) => Kind::Bytes,
            Value::Text(_) => Kind::Text,
            Value::Int(_) => Kind::Int,
            Value::Float(_) => Kind::Float,
        }
    }
}

/// Encode a value to its canonical bytes
///
/// Byte and text payloads are moved into the result without copying.
pub fn encode(value: Value) -> Result<Bytes> {
    match value {
        // Records first: a record is never treated as one of its fields
        Value::Record(fields) => record::encode_fields(&fields).map(Bytes::from),
        Value::Bytes(bytes) => Ok(bytes),
        Value::Text(text) => Ok(Bytes::from(text)),
        Value::Int(int) => Ok(Bytes::from(int.to_string())),
        Value::Float(float) => Ok(Bytes::copy_from_slice(&float.to_le_bytes())),
    }
}

/// Decode canonical bytes as the given kind
pub fn decode(bytes: Bytes, kind: Kind) -> Result<Value> {
    match kind {
        Kind::Record => record::decode_fields(&bytes).map(Value::Record),
        Kind::Bytes => Ok(Value::Bytes(bytes)),
        Kind::Text => decode_text(bytes).map(Value::Text),
        Kind::Int => decode_int(&bytes).map(Value::Int),
        Kind::Float => decode_float(&bytes).map(Value::Float),
    }
}

/// Encode a typed value
pub fn encode_as<T: Storable>(value: &T) -> Result<Bytes> {
    encode(value.to_value()?)
}

/// Decode bytes as a typed value
pub fn decode_as<T: Storable>(bytes: impl Into<Bytes>) -> Result<T> {
    T::from_value(decode(bytes.into(), T::KIND)?)
}

fn decode_text(bytes: Bytes) -> Result<String> {
    // Reuses the buffer when `bytes` is the only handle to it
    String::from_utf8(Vec::from(bytes))
        .map_err(|e| MapError::decode(format!("text is not valid UTF-8: {}", e)))
}

fn decode_int(bytes: &[u8]) -> Result<i64> {
    let text = std::str::from_utf8(bytes)
        .map_err(|_| MapError::decode("integer is not ASCII text"))?;
    text.parse::<i64>()
        .map_err(|e| MapError::decode(format!("malformed integer {:?}: {}", text, e)))
}

fn decode_float(bytes: &[u8]) -> Result<f64> {
    let raw: [u8; FLOAT_WIDTH] = bytes.try_into().map_err(|_| {
        MapError::decode(format!(
            "float must be {} bytes, got {}",
            FLOAT_WIDTH,
            bytes.len()
        ))
    })?;
    Ok(f64::from_le_bytes(raw))
}
