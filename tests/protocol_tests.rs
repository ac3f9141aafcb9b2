//! Protocol Tests
//!
//! Tests for command, response and reply payload encoding/decoding.

use std::io::Cursor;

use atlasmap::protocol::{
    decode_bool, decode_command, decode_count, decode_response, decode_scan_page, encode_bool,
    encode_command, encode_count, encode_response, encode_scan_page, read_command,
    read_response, write_command, write_response, Command, Response, Status, HEADER_SIZE,
    MAX_PAYLOAD_SIZE,
};
use atlasmap::store::{ScanCursor, ScanPage};

// =============================================================================
// Command Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_hset_with_binary_data() {
    // Null bytes and high bytes in field and value
    let field: Vec<u8> = vec![0x00, 0x01, 0xFF, 0xFE, 0x80];
    let value: Vec<u8> = (0..=255).collect();

    let cmd = Command::HSet {
        collection: "users".to_string(),
        field: field.clone(),
        value: value.clone(),
    };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();

    assert_eq!(decoded, cmd);
}

#[test]
fn test_encode_decode_empty_field_and_value() {
    let cmd = Command::HSet {
        collection: "c".to_string(),
        field: vec![],
        value: vec![],
    };
    let decoded = decode_command(&encode_command(&cmd).unwrap()).unwrap();

    match decoded {
        Command::HSet { field, value, .. } => {
            assert!(field.is_empty());
            assert!(value.is_empty());
        }
        _ => panic!("Expected HSET command"),
    }
}

#[test]
fn test_encode_decode_hscan_cursors() {
    for cursor in [ScanCursor::Start, ScanCursor::Token(b"last-field".to_vec())] {
        let cmd = Command::HScan {
            collection: "c".to_string(),
            cursor,
            count: 50,
        };
        assert_eq!(decode_command(&encode_command(&cmd).unwrap()).unwrap(), cmd);
    }
}

#[test]
fn test_collection_accessor() {
    let cmd = Command::HLen {
        collection: "orders".to_string(),
    };
    assert_eq!(cmd.collection(), Some("orders"));
    assert_eq!(Command::Ping.collection(), None);
}

// =============================================================================
// Reply Payload Tests
// =============================================================================

#[test]
fn test_bool_reply() {
    assert!(decode_bool(&encode_bool(true)).unwrap());
    assert!(!decode_bool(&encode_bool(false)).unwrap());
    assert!(decode_bool(&[0x02]).is_err());
    assert!(decode_bool(&[]).is_err());
}

#[test]
fn test_count_reply() {
    assert_eq!(decode_count(&encode_count(1 << 40)).unwrap(), 1 << 40);
    assert!(decode_count(&[0, 0, 0, 1]).is_err());
}

#[test]
fn test_scan_page_reply() {
    let page = ScanPage {
        fields: vec![b"a".to_vec(), vec![], b"ccc".to_vec()],
        next: Some(ScanCursor::Token(b"ccc".to_vec())),
    };
    assert_eq!(decode_scan_page(&encode_scan_page(&page)).unwrap(), page);

    let last = ScanPage {
        fields: vec![b"z".to_vec()],
        next: None,
    };
    assert_eq!(decode_scan_page(&encode_scan_page(&last)).unwrap(), last);
}

#[test]
fn test_scan_page_count_exceeding_payload() {
    // Done cursor, then claims a million fields with no data behind it
    let bytes = [0x00, 0x00, 0x0F, 0x42, 0x40];
    let result = decode_scan_page(&bytes);
    assert!(result.unwrap_err().to_string().contains("exceeds payload"));
}

// =============================================================================
// Response Encoding/Decoding Tests
// =============================================================================

#[test]
fn test_encode_decode_response_error() {
    let resp = Response::error("something went wrong");
    let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();

    assert_eq!(decoded.status, Status::Error);
    assert_eq!(decoded.error_message(), "something went wrong");
}

#[test]
fn test_empty_payload_decodes_as_none() {
    let resp = Response::ok(Some(vec![]));
    let decoded = decode_response(&encode_response(&resp).unwrap()).unwrap();

    assert_eq!(decoded.status, Status::Ok);
    assert_eq!(decoded.payload, None);
}

// =============================================================================
// Error Handling Tests
// =============================================================================

#[test]
fn test_incomplete_header() {
    let bytes = [0x01, 0x00, 0x00]; // Only 3 bytes, need 5
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Incomplete header"));
}

#[test]
fn test_incomplete_payload() {
    // Header says 10 bytes payload, but only 5 provided
    let bytes = [0x01, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x05, 0x68];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Incomplete"));
}

#[test]
fn test_unknown_command_type() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("Unknown command type"));
}

#[test]
fn test_unknown_response_status() {
    let bytes = [0xFF, 0x00, 0x00, 0x00, 0x00];
    let result = decode_response(&bytes);
    assert!(result.unwrap_err().to_string().contains("Unknown response status"));
}

#[test]
fn test_hget_trailing_bytes_rejected() {
    let mut bytes = encode_command(&Command::HGet {
        collection: "c".to_string(),
        field: b"f".to_vec(),
    })
    .unwrap();
    bytes.push(0xAA);
    // Fix up the payload length to cover the extra byte
    let len = (bytes.len() - 5) as u32;
    bytes[1..5].copy_from_slice(&len.to_be_bytes());

    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("trailing"));
}

#[test]
fn test_collection_must_be_utf8() {
    // HLEN with a 1-byte collection 0xFF
    let bytes = [0x06, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x01, 0xFF];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("UTF-8"));
}

#[test]
fn test_ping_with_unexpected_payload() {
    let bytes = [0x04, 0x00, 0x00, 0x00, 0x05, 0x68, 0x65, 0x6C, 0x6C, 0x6F];
    let result = decode_command(&bytes);
    assert!(result.unwrap_err().to_string().contains("unexpected payload"));
}

#[test]
fn test_oversized_frame_rejected_before_read() {
    // 0x7FFFFFFF byte payload claimed
    let bytes = [0x01, 0x7F, 0xFF, 0xFF, 0xFF];
    let result = read_command(&mut Cursor::new(bytes.to_vec()));
    assert!(result.unwrap_err().to_string().contains("too large"));
}

#[test]
fn test_oversized_command_rejected_before_write() {
    let cmd = Command::HSet {
        collection: "c".to_string(),
        field: b"f".to_vec(),
        value: vec![0u8; MAX_PAYLOAD_SIZE as usize],
    };

    let mut buffer = Vec::new();
    let result = write_command(&mut buffer, &cmd);
    assert!(result.unwrap_err().to_string().contains("too large"));
    assert!(buffer.is_empty());
}

#[test]
fn test_payload_at_limit_is_accepted() {
    // collection segment (4 + 1) + field segment (4 + 1) + value
    let value_len = MAX_PAYLOAD_SIZE as usize - 10;
    let cmd = Command::HSet {
        collection: "c".to_string(),
        field: b"f".to_vec(),
        value: vec![0u8; value_len],
    };

    let encoded = encode_command(&cmd).unwrap();
    assert_eq!(encoded.len(), HEADER_SIZE + MAX_PAYLOAD_SIZE as usize);
}

#[test]
fn test_oversized_response_rejected_before_write() {
    let resp = Response::ok(Some(vec![0u8; MAX_PAYLOAD_SIZE as usize + 1]));

    let mut buffer = Vec::new();
    assert!(write_response(&mut buffer, &resp).is_err());
    assert!(buffer.is_empty());
}

// =============================================================================
// Stream I/O Tests
// =============================================================================

#[test]
fn test_stream_multiple_commands() {
    let commands = vec![
        Command::Ping,
        Command::HSet {
            collection: "c".to_string(),
            field: b"k1".to_vec(),
            value: b"v1".to_vec(),
        },
        Command::HGet {
            collection: "c".to_string(),
            field: b"k1".to_vec(),
        },
        Command::HDel {
            collection: "c".to_string(),
            field: b"k1".to_vec(),
        },
        Command::Drop {
            collection: "c".to_string(),
        },
    ];

    let mut buffer = Vec::new();
    for cmd in &commands {
        write_command(&mut buffer, cmd).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &commands {
        assert_eq!(&read_command(&mut cursor).unwrap(), expected);
    }
}

#[test]
fn test_stream_multiple_responses() {
    let responses = vec![
        Response::ok(Some(b"data".to_vec())),
        Response::not_found(),
        Response::error("oops"),
        Response::ok(None),
    ];

    let mut buffer = Vec::new();
    for resp in &responses {
        write_response(&mut buffer, resp).unwrap();
    }

    let mut cursor = Cursor::new(buffer);
    for expected in &responses {
        assert_eq!(&read_response(&mut cursor).unwrap(), expected);
    }
}

// =============================================================================
// Wire Format Verification Tests
// =============================================================================

#[test]
fn test_wire_format_hget() {
    let cmd = Command::HGet {
        collection: "m".to_string(),
        field: b"test".to_vec(),
    };
    let encoded = encode_command(&cmd).unwrap();

    // [0x01][len 13][len 1][m][len 4][t e s t]
    assert_eq!(encoded[0], 0x01);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x0D]);
    assert_eq!(&encoded[5..9], &[0x00, 0x00, 0x00, 0x01]);
    assert_eq!(encoded[9], b'm');
    assert_eq!(&encoded[10..14], &[0x00, 0x00, 0x00, 0x04]);
    assert_eq!(&encoded[14..18], b"test");
}

#[test]
fn test_wire_format_response_ok() {
    let resp = Response::ok(Some(b"hi".to_vec()));
    let encoded = encode_response(&resp).unwrap();

    // [0x00][len 2][h i]
    assert_eq!(encoded[0], 0x00);
    assert_eq!(&encoded[1..5], &[0x00, 0x00, 0x00, 0x02]);
    assert_eq!(&encoded[5..7], b"hi");
}
