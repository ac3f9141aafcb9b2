//! Server replies
//!
//! Every command gets exactly one reply: a status byte plus an optional
//! payload whose meaning depends on the command that was sent.

use crate::error::{MapError, Result};

/// Reply status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Ok = 0x00,
    NotFound = 0x01,
    Error = 0x02,
}

impl TryFrom<u8> for Status {
    type Error = MapError;

    fn try_from(byte: u8) -> Result<Self> {
        match byte {
            0x00 => Ok(Status::Ok),
            0x01 => Ok(Status::NotFound),
            0x02 => Ok(Status::Error),
            other => Err(MapError::Protocol(format!(
                "Unknown response status: 0x{:02x}",
                other
            ))),
        }
    }
}

/// A reply to one command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,

    /// HGET value, encoded reply body, or error text.
    /// An empty payload is carried as None.
    pub payload: Option<Vec<u8>>,
}

impl Response {
    pub fn ok(payload: Option<Vec<u8>>) -> Self {
        Self {
            status: Status::Ok,
            payload,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: Status::NotFound,
            payload: None,
        }
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: Status::Error,
            payload: Some(message.as_bytes().to_vec()),
        }
    }

    /// Reply for the outcome of a store call
    ///
    /// `KeyNotFound` maps to NOT_FOUND; every other error is sent as text.
    pub fn from_result(result: Result<Option<Vec<u8>>>) -> Self {
        match result {
            Ok(payload) => Self::ok(payload),
            Err(MapError::KeyNotFound) => Self::not_found(),
            Err(e) => Self::error(&e.to_string()),
        }
    }

    /// Error text carried by an ERROR reply
    pub fn error_message(&self) -> String {
        match self.payload.as_deref() {
            Some(text) => String::from_utf8_lossy(text).into_owned(),
            None => "unknown error".to_string(),
        }
    }

    /// Client side of [`from_result`](Self::from_result)
    ///
    /// NOT_FOUND becomes `KeyNotFound` and ERROR becomes `Remote`.
    pub fn into_result(self) -> Result<Option<Vec<u8>>> {
        match self.status {
            Status::Ok => Ok(self.payload),
            Status::NotFound => Err(MapError::KeyNotFound),
            Status::Error => Err(MapError::Remote(self.error_message())),
        }
    }
}
