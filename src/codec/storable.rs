//! Static bridge between Rust types and supported values

use bytes::Bytes;

use super::record::{self, Record};
use super::{Kind, Value};
use crate::error::{MapError, Result};

/// A Rust type that maps onto one supported value kind
///
/// `KIND` selects the decode path. It is the only thing a map handle knows
/// about its key and value types; stored bytes carry no tag.
pub trait Storable: Sized {
    const KIND: Kind;

    fn to_value(&self) -> Result<Value>;

    fn from_value(value: Value) -> Result<Self>;
}

fn mismatch<T>(expected: Kind, got: &Value) -> Result<T> {
    Err(MapError::decode(format!(
        "expected {} value, got {}",
        expected,
        got.kind()
    )))
}

impl<T: Record> Storable for T {
    const KIND: Kind = Kind::Record;

    fn to_value(&self) -> Result<Value> {
        record::to_fields(self).map(Value::Record)
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Record(fields) => record::from_fields(fields),
            other => mismatch(Kind::Record, &other),
        }
    }
}

impl Storable for Bytes {
    const KIND: Kind = Kind::Bytes;

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bytes(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => Ok(bytes),
            other => mismatch(Kind::Bytes, &other),
        }
    }
}

impl Storable for Vec<u8> {
    const KIND: Kind = Kind::Bytes;

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Bytes(Bytes::copy_from_slice(self)))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Bytes(bytes) => Ok(bytes.to_vec()),
            other => mismatch(Kind::Bytes, &other),
        }
    }
}

impl Storable for String {
    const KIND: Kind = Kind::Text;

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Text(self.clone()))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(text) => Ok(text),
            other => mismatch(Kind::Text, &other),
        }
    }
}

impl Storable for f64 {
    const KIND: Kind = Kind::Float;

    fn to_value(&self) -> Result<Value> {
        Ok(Value::Float(*self))
    }

    fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(float) => Ok(float),
            other => mismatch(Kind::Float, &other),
        }
    }
}

macro_rules! impl_storable_int {
    ($($ty:ty),*) => {
        $(
            impl Storable for $ty {
                const KIND: Kind = Kind::Int;

                fn to_value(&self) -> Result<Value> {
                    i64::try_from(*self).map(Value::Int).map_err(|_| {
                        MapError::encode(format!("{} does not fit a signed 64-bit integer", self))
                    })
                }

                fn from_value(value: Value) -> Result<Self> {
                    match value {
                        Value::Int(int) => <$ty>::try_from(int).map_err(|_| {
                            MapError::decode(format!(
                                "{} is out of range for {}",
                                int,
                                stringify!($ty)
                            ))
                        }),
                        other => mismatch(Kind::Int, &other),
                    }
                }
            }
        )*
    };
}

impl_storable_int!(i16, i32, i64, u16, u32, u64);
