//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │ Cmd (1)  │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Payload by Command Type
//! A segment is `len (4 bytes) + bytes`.
//! - HGET / HDEL / HEXISTS: collection segment + field segment
//! - HSET:   collection segment + field segment + value (rest of payload)
//! - HLEN / DROP: collection segment
//! - HSCAN:  collection segment + cursor + count (4 bytes)
//! - PING:   empty
//!
//! A cursor is `0x00` (start) or `0x01` + token segment.
//!
//! ### Response Format
//! ```text
//! ┌──────────┬──────────┬─────────────────────────────┐
//! │Status(1) │ Len (4)  │         Payload             │
//! └──────────┴──────────┴─────────────────────────────┘
//! ```
//!
//! ### Reply Payloads
//! - HGET:    value bytes
//! - HDEL / HEXISTS: 1 byte, 0x00 or 0x01
//! - HLEN:    count (8 bytes)
//! - HSCAN:   next cursor (`0x00` done, `0x01` + token segment)
//!            + field count (4 bytes) + field segments

use std::io::{Read, Write};

use super::{Command, CommandType, Response, Status};
use crate::error::{MapError, Result};
use crate::store::{ScanCursor, ScanPage};

/// Header size: 1 byte command/status + 4 bytes length
pub const HEADER_SIZE: usize = 5;

/// Maximum payload size (16 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 16 * 1024 * 1024;

const CURSOR_START: u8 = 0x00;
const CURSOR_TOKEN: u8 = 0x01;

// =============================================================================
// Payload Helpers
// =============================================================================

fn put_segment(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    buf.extend_from_slice(bytes);
}

fn put_cursor(buf: &mut Vec<u8>, cursor: Option<&ScanCursor>) {
    match cursor {
        Some(ScanCursor::Token(token)) => {
            buf.push(CURSOR_TOKEN);
            put_segment(buf, token);
        }
        _ => buf.push(CURSOR_START),
    }
}

/// Sequential reader over a payload
struct PayloadReader<'a> {
    what: &'static str,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PayloadReader<'a> {
    fn new(what: &'static str, buf: &'a [u8]) -> Self {
        Self { what, buf, pos: 0 }
    }

    fn take(&mut self, len: usize, field: &str) -> Result<&'a [u8]> {
        let remaining = self.buf.len() - self.pos;
        if remaining < len {
            return Err(MapError::Protocol(format!(
                "{}: incomplete {} (expected {}, got {})",
                self.what, field, len, remaining
            )));
        }
        let buf = self.buf;
        let slice = &buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self, field: &str) -> Result<u8> {
        Ok(self.take(1, field)?[0])
    }

    fn u32(&mut self, field: &str) -> Result<u32> {
        let b = self.take(4, field)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    fn u64(&mut self, field: &str) -> Result<u64> {
        let b = self.take(8, field)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_be_bytes(raw))
    }

    fn segment(&mut self, field: &str) -> Result<&'a [u8]> {
        let len = self.u32(field)? as usize;
        self.take(len, field)
    }

    fn string(&mut self, field: &str) -> Result<String> {
        let bytes = self.segment(field)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| {
            MapError::Protocol(format!("{}: {} is not valid UTF-8", self.what, field))
        })
    }

    fn cursor(&mut self) -> Result<Option<ScanCursor>> {
        match self.u8("cursor flag")? {
            CURSOR_START => Ok(None),
            CURSOR_TOKEN => Ok(Some(ScanCursor::Token(self.segment("cursor")?.to_vec()))),
            other => Err(MapError::Protocol(format!(
                "{}: unknown cursor flag 0x{:02x}",
                self.what, other
            ))),
        }
    }

    fn rest(&mut self) -> &'a [u8] {
        let buf = self.buf;
        let rest = &buf[self.pos..];
        self.pos = buf.len();
        rest
    }

    fn finish(self) -> Result<()> {
        if self.pos != self.buf.len() {
            return Err(MapError::Protocol(format!(
                "{}: unexpected {} trailing bytes",
                self.what,
                self.buf.len() - self.pos
            )));
        }
        Ok(())
    }
}

fn check_payload_len(payload_len: usize, what: &str) -> Result<()> {
    if payload_len > MAX_PAYLOAD_SIZE as usize {
        return Err(MapError::Protocol(format!(
            "{} too large: {} bytes (max {})",
            what, payload_len, MAX_PAYLOAD_SIZE
        )));
    }
    Ok(())
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Encode a command to bytes
///
/// Format: cmd_type (1) + payload_len (4) + payload
///
/// Fails with a protocol error if the payload exceeds `MAX_PAYLOAD_SIZE`,
/// which the server would refuse.
pub fn encode_command(command: &Command) -> Result<Vec<u8>> {
    let cmd_type = command.command_type() as u8;

    let mut payload = Vec::new();
    match command {
        Command::HGet { collection, field }
        | Command::HDel { collection, field }
        | Command::HExists { collection, field } => {
            put_segment(&mut payload, collection.as_bytes());
            put_segment(&mut payload, field);
        }
        Command::HSet {
            collection,
            field,
            value,
        } => {
            payload.reserve(8 + collection.len() + field.len() + value.len());
            put_segment(&mut payload, collection.as_bytes());
            put_segment(&mut payload, field);
            payload.extend_from_slice(value);
        }
        Command::HLen { collection } | Command::Drop { collection } => {
            put_segment(&mut payload, collection.as_bytes());
        }
        Command::HScan {
            collection,
            cursor,
            count,
        } => {
            put_segment(&mut payload, collection.as_bytes());
            put_cursor(&mut payload, Some(cursor));
            payload.extend_from_slice(&count.to_be_bytes());
        }
        Command::Ping => {}
    }
    check_payload_len(payload.len(), "Command payload")?;

    // Build full message: header + payload
    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(cmd_type);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&payload);

    Ok(message)
}

/// Decode a command from bytes
pub fn decode_command(bytes: &[u8]) -> Result<Command> {
    if bytes.len() < HEADER_SIZE {
        return Err(MapError::Protocol(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    // Parse header
    let cmd_byte = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    check_payload_len(payload_len, "Payload")?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(MapError::Protocol(format!(
            "Incomplete payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let payload = &bytes[HEADER_SIZE..total_len];

    let cmd_type = CommandType::try_from(cmd_byte).map_err(|byte| {
        MapError::Protocol(format!("Unknown command type: 0x{:02x}", byte))
    })?;

    match cmd_type {
        CommandType::HGet => {
            let (collection, field) = decode_field_payload("HGET command", payload)?;
            Ok(Command::HGet { collection, field })
        }
        CommandType::HDel => {
            let (collection, field) = decode_field_payload("HDEL command", payload)?;
            Ok(Command::HDel { collection, field })
        }
        CommandType::HExists => {
            let (collection, field) = decode_field_payload("HEXISTS command", payload)?;
            Ok(Command::HExists { collection, field })
        }
        CommandType::HSet => {
            let mut reader = PayloadReader::new("HSET command", payload);
            let collection = reader.string("collection")?;
            let field = reader.segment("field")?.to_vec();
            let value = reader.rest().to_vec();
            Ok(Command::HSet {
                collection,
                field,
                value,
            })
        }
        CommandType::HLen => {
            let collection = decode_collection_payload("HLEN command", payload)?;
            Ok(Command::HLen { collection })
        }
        CommandType::Drop => {
            let collection = decode_collection_payload("DROP command", payload)?;
            Ok(Command::Drop { collection })
        }
        CommandType::HScan => {
            let mut reader = PayloadReader::new("HSCAN command", payload);
            let collection = reader.string("collection")?;
            let cursor = reader.cursor()?.unwrap_or(ScanCursor::Start);
            let count = reader.u32("count")?;
            reader.finish()?;
            Ok(Command::HScan {
                collection,
                cursor,
                count,
            })
        }
        CommandType::Ping => {
            if !payload.is_empty() {
                return Err(MapError::Protocol(format!(
                    "PING command: unexpected payload of {} bytes",
                    payload.len()
                )));
            }
            Ok(Command::Ping)
        }
    }
}

fn decode_field_payload(what: &'static str, payload: &[u8]) -> Result<(String, Vec<u8>)> {
    let mut reader = PayloadReader::new(what, payload);
    let collection = reader.string("collection")?;
    let field = reader.segment("field")?.to_vec();
    reader.finish()?;
    Ok((collection, field))
}

fn decode_collection_payload(what: &'static str, payload: &[u8]) -> Result<String> {
    let mut reader = PayloadReader::new(what, payload);
    let collection = reader.string("collection")?;
    reader.finish()?;
    Ok(collection)
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Format: status (1) + payload_len (4) + payload
pub fn encode_response(response: &Response) -> Result<Vec<u8>> {
    let payload = response.payload.as_deref().unwrap_or(&[]);
    check_payload_len(payload.len(), "Response payload")?;

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.push(response.status as u8);
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(payload);

    Ok(message)
}

/// Decode a response from bytes
///
/// An empty payload decodes as `None`.
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    if bytes.len() < HEADER_SIZE {
        return Err(MapError::Protocol(format!(
            "Incomplete response header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    // Parse header
    let status_byte = bytes[0];
    let payload_len = u32::from_be_bytes([bytes[1], bytes[2], bytes[3], bytes[4]]) as usize;
    check_payload_len(payload_len, "Response payload")?;

    let total_len = HEADER_SIZE + payload_len;
    if bytes.len() < total_len {
        return Err(MapError::Protocol(format!(
            "Incomplete response payload: expected {} bytes, got {}",
            total_len,
            bytes.len()
        )));
    }

    let status = Status::try_from(status_byte)?;

    // Extract payload
    let payload = if payload_len > 0 {
        Some(bytes[HEADER_SIZE..total_len].to_vec())
    } else {
        None
    };

    Ok(Response { status, payload })
}

// =============================================================================
// Reply Payloads
// =============================================================================

/// Encode a boolean reply body
pub fn encode_bool(value: bool) -> Vec<u8> {
    vec![value as u8]
}

/// Decode a boolean reply body
pub fn decode_bool(payload: &[u8]) -> Result<bool> {
    let mut reader = PayloadReader::new("bool reply", payload);
    let value = match reader.u8("flag")? {
        0 => false,
        1 => true,
        other => {
            return Err(MapError::Protocol(format!(
                "bool reply: invalid flag 0x{:02x}",
                other
            )))
        }
    };
    reader.finish()?;
    Ok(value)
}

/// Encode a count reply body
pub fn encode_count(count: u64) -> Vec<u8> {
    count.to_be_bytes().to_vec()
}

/// Decode a count reply body
pub fn decode_count(payload: &[u8]) -> Result<u64> {
    let mut reader = PayloadReader::new("count reply", payload);
    let count = reader.u64("count")?;
    reader.finish()?;
    Ok(count)
}

/// Encode a scan page reply body
pub fn encode_scan_page(page: &ScanPage) -> Vec<u8> {
    let mut payload = Vec::new();
    put_cursor(&mut payload, page.next.as_ref());
    payload.extend_from_slice(&(page.fields.len() as u32).to_be_bytes());
    for field in &page.fields {
        put_segment(&mut payload, field);
    }
    payload
}

/// Decode a scan page reply body
///
/// A `Start` cursor on the wire means the enumeration is done.
pub fn decode_scan_page(payload: &[u8]) -> Result<ScanPage> {
    let mut reader = PayloadReader::new("scan reply", payload);
    let next = reader.cursor()?;
    let count = reader.u32("field count")? as usize;

    // Every field needs at least its length prefix
    if count > payload.len() / 4 {
        return Err(MapError::Protocol(format!(
            "scan reply: field count {} exceeds payload",
            count
        )));
    }

    let mut fields = Vec::with_capacity(count);
    for _ in 0..count {
        fields.push(reader.segment("field")?.to_vec());
    }
    reader.finish()?;

    Ok(ScanPage { fields, next })
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one framed message (header + payload)
fn read_frame<R: Read>(reader: &mut R, what: &str) -> Result<Vec<u8>> {
    // Read header first
    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;

    let payload_len = u32::from_be_bytes([header[1], header[2], header[3], header[4]]) as usize;
    check_payload_len(payload_len, what)?;

    let mut frame = vec![0u8; HEADER_SIZE + payload_len];
    frame[..HEADER_SIZE].copy_from_slice(&header);
    if payload_len > 0 {
        reader.read_exact(&mut frame[HEADER_SIZE..])?;
    }
    Ok(frame)
}

/// Read a complete command from a stream
///
/// Blocks until a complete command is received or an error occurs
pub fn read_command<R: Read>(reader: &mut R) -> Result<Command> {
    let frame = read_frame(reader, "Payload")?;
    decode_command(&frame)
}

/// Write a command to a stream
///
/// Nothing is written if the command cannot be encoded.
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    let bytes = encode_command(command)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader, "Response payload")?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    writer.write_all(&bytes)?;
    writer.flush()?;
    Ok(())
}
