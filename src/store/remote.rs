//! TCP store client
//!
//! Blocking client for `atlasmap-server`. One request in flight per client;
//! callers that need parallelism open several clients.

use std::io::{self, BufReader, BufWriter, Write};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use parking_lot::Mutex;

use super::{ScanCursor, ScanPage, Store};
use crate::config::Config;
use crate::error::{MapError, Result};
use crate::protocol::{
    decode_bool, decode_count, decode_scan_page, encode_command, read_response, Command,
    Response, Status,
};

/// Buffered halves of the client socket
struct ClientConn {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,

    /// Set once an I/O error leaves the stream mid-frame
    broken: bool,
}

/// Store backed by a remote `atlasmap-server`
///
/// Connection errors are returned as-is. After one, the client refuses
/// further requests: the stream may be out of step with the server and the
/// caller has to reconnect.
pub struct RemoteStore {
    conn: Mutex<ClientConn>,
    peer_addr: SocketAddr,
}

impl RemoteStore {
    /// Connect using the address and timeouts in `config`
    pub fn connect(config: &Config) -> Result<Self> {
        let stream = open_stream(config)?;
        let peer_addr = stream.peer_addr()?;

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout())?;
        stream.set_write_timeout(config.write_timeout())?;

        let read_stream = stream.try_clone()?;

        tracing::debug!("Connected to store server at {}", peer_addr);

        Ok(Self {
            conn: Mutex::new(ClientConn {
                reader: BufReader::new(read_stream),
                writer: BufWriter::new(stream),
                broken: false,
            }),
            peer_addr,
        })
    }

    /// Connect to `addr` with default timeouts
    pub fn connect_addr(addr: impl Into<String>) -> Result<Self> {
        Self::connect(&Config::builder().listen_addr(addr).build())
    }

    /// Health check
    pub fn ping(&self) -> Result<()> {
        let response = self.request(Command::Ping)?;
        response.into_result().map(|_| ())
    }

    /// Address of the server
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Send one command and wait for its response
    ///
    /// A command too large to frame is rejected before anything is sent and
    /// leaves the connection usable.
    fn request(&self, command: Command) -> Result<Response> {
        let frame = encode_command(&command)?;

        let mut conn = self.conn.lock();
        if conn.broken {
            return Err(MapError::Io(io::Error::new(
                io::ErrorKind::NotConnected,
                "connection is unusable after an earlier I/O error",
            )));
        }

        tracing::trace!("Sending to {}: {:?}", self.peer_addr, command.command_type());

        let conn = &mut *conn;
        let result = send_frame(&mut conn.writer, &frame)
            .and_then(|()| read_response(&mut conn.reader));
        if let Err(MapError::Io(_) | MapError::Protocol(_)) = &result {
            conn.broken = true;
        }
        result
    }
}

fn send_frame(writer: &mut BufWriter<TcpStream>, frame: &[u8]) -> Result<()> {
    writer.write_all(frame)?;
    writer.flush()?;
    Ok(())
}

fn open_stream(config: &Config) -> Result<TcpStream> {
    let mut last_err = None;
    for addr in config.listen_addr.to_socket_addrs()? {
        let attempt = match config.connect_timeout() {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout),
            None => TcpStream::connect(addr),
        };
        match attempt {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    match last_err {
        Some(e) => Err(MapError::Io(e)),
        None => Err(MapError::Config(format!(
            "address {:?} did not resolve",
            config.listen_addr
        ))),
    }
}

/// Body of an OK reply; an empty body arrives as no payload
fn expect_payload(response: Response) -> Result<Vec<u8>> {
    response.into_result().map(Option::unwrap_or_default)
}

impl Store for RemoteStore {
    fn field_get(&self, collection: &str, field: &[u8]) -> Result<Option<Vec<u8>>> {
        let response = self.request(Command::HGet {
            collection: collection.to_string(),
            field: field.to_vec(),
        })?;
        match response.status {
            Status::NotFound => Ok(None),
            // An empty value travels as an empty payload
            _ => expect_payload(response).map(Some),
        }
    }

    fn field_set(&self, collection: &str, field: &[u8], value: &[u8]) -> Result<()> {
        let response = self.request(Command::HSet {
            collection: collection.to_string(),
            field: field.to_vec(),
            value: value.to_vec(),
        })?;
        response.into_result().map(|_| ())
    }

    fn field_delete(&self, collection: &str, field: &[u8]) -> Result<bool> {
        let response = self.request(Command::HDel {
            collection: collection.to_string(),
            field: field.to_vec(),
        })?;
        decode_bool(&expect_payload(response)?)
    }

    fn field_exists(&self, collection: &str, field: &[u8]) -> Result<bool> {
        let response = self.request(Command::HExists {
            collection: collection.to_string(),
            field: field.to_vec(),
        })?;
        decode_bool(&expect_payload(response)?)
    }

    fn field_count(&self, collection: &str) -> Result<usize> {
        let response = self.request(Command::HLen {
            collection: collection.to_string(),
        })?;
        let count = decode_count(&expect_payload(response)?)?;
        usize::try_from(count)
            .map_err(|_| MapError::Protocol(format!("field count {} overflows usize", count)))
    }

    fn field_scan(
        &self,
        collection: &str,
        cursor: &ScanCursor,
        count: usize,
    ) -> Result<ScanPage> {
        let response = self.request(Command::HScan {
            collection: collection.to_string(),
            cursor: cursor.clone(),
            count: u32::try_from(count).unwrap_or(u32::MAX),
        })?;
        decode_scan_page(&expect_payload(response)?)
    }

    fn collection_destroy(&self, collection: &str) -> Result<()> {
        let response = self.request(Command::Drop {
            collection: collection.to_string(),
        })?;
        response.into_result().map(|_| ())
    }
}
