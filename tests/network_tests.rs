//! Client/server tests
//!
//! Runs `Server` on a loopback port and drives it through `RemoteStore`.

use std::io::{BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use atlasmap::network::{Server, ShutdownHandle};
use atlasmap::protocol::{read_response, Status, MAX_PAYLOAD_SIZE};
use atlasmap::store::ScanCursor;
use atlasmap::{Config, MapError, MemoryStore, Record, RemoteStore, Result, Store, TypedMap};
use serde::{Deserialize, Serialize};

// =============================================================================
// Helper Functions
// =============================================================================

struct TestServer {
    addr: SocketAddr,
    store: Arc<MemoryStore>,
    shutdown: ShutdownHandle,
    thread: Option<JoinHandle<Result<()>>>,
}

impl TestServer {
    fn start() -> Self {
        Self::start_with(Config::builder())
    }

    fn start_with(builder: atlasmap::config::ConfigBuilder) -> Self {
        let config = builder
            .listen_addr("127.0.0.1:0")
            .read_timeout_ms(2000)
            .build();
        let store = Arc::new(MemoryStore::new());
        let server = Server::bind(config, Arc::clone(&store)).unwrap();
        let addr = server.local_addr().unwrap();
        let shutdown = server.shutdown_handle();
        let thread = thread::spawn(move || server.run());

        Self {
            addr,
            store,
            shutdown,
            thread: Some(thread),
        }
    }

    fn client(&self) -> RemoteStore {
        RemoteStore::connect_addr(self.addr.to_string()).unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct ValueModel {
    x: i64,
    y: f64,
    s: String,
}

impl Record for ValueModel {}

// =============================================================================
// Store Command Tests
// =============================================================================

#[test]
fn test_ping() {
    let server = TestServer::start();
    let client = server.client();
    client.ping().unwrap();
    assert_eq!(client.peer_addr(), server.addr);
}

#[test]
fn test_field_commands() {
    let server = TestServer::start();
    let client = server.client();

    assert_eq!(client.field_get("c", b"f").unwrap(), None);
    assert!(!client.field_exists("c", b"f").unwrap());

    client.field_set("c", b"f", b"value").unwrap();
    assert_eq!(client.field_get("c", b"f").unwrap(), Some(b"value".to_vec()));
    assert!(client.field_exists("c", b"f").unwrap());
    assert_eq!(client.field_count("c").unwrap(), 1);

    assert!(client.field_delete("c", b"f").unwrap());
    assert!(!client.field_delete("c", b"f").unwrap());
    assert_eq!(client.field_count("c").unwrap(), 0);
}

#[test]
fn test_empty_value_is_not_absent() {
    let server = TestServer::start();
    let client = server.client();

    client.field_set("c", b"empty", b"").unwrap();
    assert_eq!(client.field_get("c", b"empty").unwrap(), Some(Vec::new()));
}

#[test]
fn test_writes_land_in_server_store() {
    let server = TestServer::start();
    let client = server.client();

    client.field_set("shared", b"k", b"v").unwrap();
    assert_eq!(server.store.field_get("shared", b"k").unwrap(), Some(b"v".to_vec()));

    client.collection_destroy("shared").unwrap();
    assert_eq!(server.store.collection_count(), 0);
}

#[test]
fn test_scan_over_the_wire() {
    let server = TestServer::start();
    let client = server.client();
    for i in 0..7u8 {
        client.field_set("c", &[b'a' + i], b"1").unwrap();
    }

    let mut cursor = ScanCursor::Start;
    let mut seen = Vec::new();
    let mut pages = 0;
    loop {
        let page = client.field_scan("c", &cursor, 3).unwrap();
        pages += 1;
        seen.extend(page.fields);
        match page.next {
            Some(next) => cursor = next,
            None => break,
        }
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 7);
}

// =============================================================================
// Typed Map Over TCP Tests
// =============================================================================

#[test]
fn test_typed_map_over_tcp() {
    let server = TestServer::start();
    let client = server.client();
    let map: TypedMap<_, String, ValueModel> = TypedMap::new(&client, "models").scan_batch(2);

    let model = ValueModel {
        x: 1,
        y: 1.3,
        s: "kek".to_string(),
    };
    for name in ["a", "b", "c"] {
        map.set(&name.to_string(), &model).unwrap();
    }

    assert_eq!(map.get(&"b".to_string()).unwrap(), model);
    assert_eq!(map.len().unwrap(), 3);

    let mut keys: Vec<String> = map.keys().collect::<Result<_>>().unwrap();
    keys.sort();
    assert_eq!(keys, vec!["a", "b", "c"]);

    map.delete(&"a".to_string()).unwrap();
    assert!(matches!(map.get(&"a".to_string()), Err(MapError::KeyNotFound)));

    map.clear().unwrap();
    assert_eq!(map.len().unwrap(), 0);
}

#[test]
fn test_two_clients_share_collections() {
    let server = TestServer::start();
    let writer_client = server.client();
    let reader_client = server.client();

    let writer: TypedMap<_, i64, f64> = TypedMap::new(&writer_client, "floats");
    let reader: TypedMap<_, i64, f64> = TypedMap::new(&reader_client, "floats");

    writer.set(&-4, &2.5).unwrap();
    assert_eq!(reader.get(&-4).unwrap(), 2.5);
}

// =============================================================================
// Failure Tests
// =============================================================================

#[test]
fn test_connection_limit() {
    let server = TestServer::start_with(Config::builder().max_connections(1));
    let first = server.client();
    first.ping().unwrap();

    // The second connection is told to go away
    let stream = TcpStream::connect(server.addr).unwrap();
    let mut reader = BufReader::new(stream);
    let response = read_response(&mut reader).unwrap();
    assert_eq!(response.status, Status::Error);
    assert!(response.error_message().contains("too many connections"));

    // The first keeps working
    first.ping().unwrap();
}

#[test]
fn test_garbage_frame_gets_error_response() {
    let server = TestServer::start();
    let stream = TcpStream::connect(server.addr).unwrap();
    let mut writer = BufWriter::new(stream.try_clone().unwrap());
    let mut reader = BufReader::new(stream);

    // Unknown command byte, empty payload
    writer.write_all(&[0xEE, 0x00, 0x00, 0x00, 0x00]).unwrap();
    writer.flush().unwrap();

    let response = read_response(&mut reader).unwrap();
    assert_eq!(response.status, Status::Error);
    assert!(response.error_message().contains("Unknown command type"));
}

#[test]
fn test_client_errors_after_server_stops() {
    let server = TestServer::start();
    let client = server.client();
    client.ping().unwrap();

    drop(server);

    // Either the write or the read fails; the error is passed through
    assert!(matches!(client.ping(), Err(MapError::Io(_))));
    assert!(matches!(client.field_count("c"), Err(MapError::Io(_))));
}

#[test]
fn test_oversized_value_leaves_client_usable() {
    let server = TestServer::start();
    let client = server.client();
    let map: TypedMap<_, i64, Vec<u8>> = TypedMap::new(&client, "blobs");

    let too_big = vec![7u8; MAX_PAYLOAD_SIZE as usize + 1];
    assert!(matches!(map.set(&1, &too_big), Err(MapError::Protocol(_))));

    // Nothing reached the server and the connection is still in step
    map.set(&2, &vec![1]).unwrap();
    assert_eq!(map.get(&2).unwrap(), vec![1]);
    assert!(!map.contains(&1).unwrap());
    client.ping().unwrap();
}

#[test]
fn test_invalid_config_rejected() {
    let config = Config::builder()
        .listen_addr("127.0.0.1:0")
        .max_connections(0)
        .build();
    let result = Server::bind(config, Arc::new(MemoryStore::new()));
    assert!(matches!(result, Err(MapError::Config(_))));
}
