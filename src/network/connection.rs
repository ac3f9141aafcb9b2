//! Connection Handler
//!
//! Handles individual client connections.

use std::io::{BufReader, BufWriter, ErrorKind};
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{MapError, Result};
use crate::protocol::{
    encode_bool, encode_count, encode_scan_page, read_command, write_response, Command,
    Response,
};
use crate::store::Store;

/// Handles a single client connection
pub struct Connection<S> {
    /// TCP stream reader (buffered for efficiency)
    reader: BufReader<TcpStream>,

    /// TCP stream writer (buffered for efficiency)
    writer: BufWriter<TcpStream>,

    /// Store that commands are executed against
    store: Arc<S>,

    /// Peer address for logging
    peer_addr: String,
}

impl<S: Store> Connection<S> {
    /// Create a new connection handler
    ///
    /// Sets up buffered I/O
    pub fn new(stream: TcpStream, store: Arc<S>) -> Result<Self> {
        // Get peer address for logging before we split the stream
        let peer_addr = stream
            .peer_addr()
            .map(|a| a.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        // Disable Nagle's algorithm for low latency
        stream.set_nodelay(true)?;

        // Clone stream for separate read/write handles
        let read_stream = stream.try_clone()?;
        let write_stream = stream;

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(write_stream),
            store,
            peer_addr,
        })
    }

    /// Configure connection timeouts (None = block forever)
    pub fn set_timeouts(&mut self, read: Option<Duration>, write: Option<Duration>) -> Result<()> {
        self.reader.get_ref().set_read_timeout(read)?;
        self.writer.get_ref().set_write_timeout(write)?;
        Ok(())
    }

    /// Handle the connection (blocking until closed)
    ///
    /// Reads commands in a loop and sends responses.
    /// Returns when the client disconnects or an error occurs.
    pub fn handle(&mut self) -> Result<()> {
        tracing::debug!("Connection established from {}", self.peer_addr);

        loop {
            let command = match read_command(&mut self.reader) {
                Ok(cmd) => cmd,
                Err(MapError::Io(ref e)) if is_disconnect(e.kind()) => {
                    tracing::debug!("Client {} disconnected: {}", self.peer_addr, e);
                    return Ok(());
                }
                Err(MapError::Io(ref e)) if is_timeout(e.kind()) => {
                    tracing::debug!("Read timeout for client {}", self.peer_addr);
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!("Error reading from {}: {}", self.peer_addr, e);
                    // Send error response if possible
                    let _ = self.send_response(Response::error(&e.to_string()));
                    return Err(e);
                }
            };

            tracing::trace!("Received command from {}: {:?}", self.peer_addr, command);

            let response = execute_command(self.store.as_ref(), command);

            // A reply too large to frame is never partially written
            let sent = match self.send_response(response) {
                Err(MapError::Protocol(message)) => {
                    tracing::warn!("Reply to {} not sent: {}", self.peer_addr, message);
                    self.send_response(Response::error(&message))
                }
                other => other,
            };

            if let Err(e) = sent {
                // The client left before the response could be sent
                if let MapError::Io(ref io_err) = e {
                    if is_disconnect(io_err.kind()) {
                        tracing::debug!(
                            "Client {} disconnected before response could be sent: {}",
                            self.peer_addr,
                            e
                        );
                        return Ok(());
                    }
                }
                tracing::warn!("Error writing to {}: {}", self.peer_addr, e);
                return Err(e);
            }
        }
    }

    /// Send a response to the client
    fn send_response(&mut self, response: Response) -> Result<()> {
        write_response(&mut self.writer, &response)
    }

    /// Get the peer address string
    pub fn peer_addr(&self) -> &str {
        &self.peer_addr
    }
}

fn is_disconnect(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
    )
}

/// Windows reports TimedOut where Unix reports WouldBlock
fn is_timeout(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::WouldBlock | ErrorKind::TimedOut)
}

/// Execute a command against a store and build the response
pub fn execute_command<S: Store + ?Sized>(store: &S, command: Command) -> Response {
    let result = match command {
        Command::HGet { collection, field } => match store.field_get(&collection, &field) {
            Ok(Some(value)) => Ok(Some(value)),
            Ok(None) => return Response::not_found(),
            Err(e) => Err(e),
        },
        Command::HSet {
            collection,
            field,
            value,
        } => store.field_set(&collection, &field, &value).map(|()| None),
        Command::HDel { collection, field } => store
            .field_delete(&collection, &field)
            .map(|removed| Some(encode_bool(removed))),
        Command::HExists { collection, field } => store
            .field_exists(&collection, &field)
            .map(|exists| Some(encode_bool(exists))),
        Command::HLen { collection } => store
            .field_count(&collection)
            .map(|count| Some(encode_count(count as u64))),
        Command::HScan {
            collection,
            cursor,
            count,
        } => store
            .field_scan(&collection, &cursor, count as usize)
            .map(|page| Some(encode_scan_page(&page))),
        Command::Drop { collection } => store.collection_destroy(&collection).map(|()| None),
        Command::Ping => Ok(Some(b"PONG".to_vec())),
    };

    Response::from_result(result)
}
