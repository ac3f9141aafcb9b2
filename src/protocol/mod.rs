//! Protocol Module
//!
//! Defines the wire protocol between `RemoteStore` and `atlasmap-server`.
//!
//! ## Protocol Format (V1 - Simple Binary)
//!
//! ### Request Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Commands
//! - 0x01: HGET    - Payload: collection + field
//! - 0x02: HSET    - Payload: collection + field + value
//! - 0x03: HDEL    - Payload: collection + field
//! - 0x04: PING    - Payload: empty
//! - 0x05: HEXISTS - Payload: collection + field
//! - 0x06: HLEN    - Payload: collection
//! - 0x07: HSCAN   - Payload: collection + cursor + count
//! - 0x08: DROP    - Payload: collection
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Status Codes
//! - 0x00: OK
//! - 0x01: NOT_FOUND
//! - 0x02: ERROR

mod codec;
mod command;
mod response;

pub use codec::{
    decode_bool, decode_command, decode_count, decode_response, decode_scan_page, encode_bool,
    encode_command, encode_count, encode_response, encode_scan_page, read_command,
    read_response, write_command, write_response, HEADER_SIZE, MAX_PAYLOAD_SIZE,
};
pub use command::{Command, CommandType};
pub use response::{Response, Status};
