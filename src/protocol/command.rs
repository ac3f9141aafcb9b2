//! Command definitions
//!
//! Represents commands from clients.

use crate::store::ScanCursor;

/// Command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    HGet = 0x01,
    HSet = 0x02,
    HDel = 0x03,
    Ping = 0x04,
    HExists = 0x05,
    HLen = 0x06,
    HScan = 0x07,
    Drop = 0x08,
}

impl TryFrom<u8> for CommandType {
    type Error = u8;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0x01 => Ok(CommandType::HGet),
            0x02 => Ok(CommandType::HSet),
            0x03 => Ok(CommandType::HDel),
            0x04 => Ok(CommandType::Ping),
            0x05 => Ok(CommandType::HExists),
            0x06 => Ok(CommandType::HLen),
            0x07 => Ok(CommandType::HScan),
            0x08 => Ok(CommandType::Drop),
            other => Err(other),
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Read one field of a collection
    HGet { collection: String, field: Vec<u8> },

    /// Create or overwrite one field
    HSet {
        collection: String,
        field: Vec<u8>,
        value: Vec<u8>,
    },

    /// Remove one field
    HDel { collection: String, field: Vec<u8> },

    /// Ping (health check)
    Ping,

    /// Check whether a field exists
    HExists { collection: String, field: Vec<u8> },

    /// Count the fields of a collection
    HLen { collection: String },

    /// Fetch one page of field names
    HScan {
        collection: String,
        cursor: ScanCursor,
        count: u32,
    },

    /// Destroy a whole collection
    Drop { collection: String },
}

impl Command {
    /// Get the command type
    pub fn command_type(&self) -> CommandType {
        match self {
            Command::HGet { .. } => CommandType::HGet,
            Command::HSet { .. } => CommandType::HSet,
            Command::HDel { .. } => CommandType::HDel,
            Command::Ping => CommandType::Ping,
            Command::HExists { .. } => CommandType::HExists,
            Command::HLen { .. } => CommandType::HLen,
            Command::HScan { .. } => CommandType::HScan,
            Command::Drop { .. } => CommandType::Drop,
        }
    }

    /// The collection this command targets, if any
    pub fn collection(&self) -> Option<&str> {
        match self {
            Command::HGet { collection, .. }
            | Command::HSet { collection, .. }
            | Command::HDel { collection, .. }
            | Command::HExists { collection, .. }
            | Command::HLen { collection }
            | Command::HScan { collection, .. }
            | Command::Drop { collection } => Some(collection),
            Command::Ping => None,
        }
    }
}
