//! TCP Server
//!
//! Accepts connections and hands each to its own thread.

use std::io::{BufWriter, ErrorKind};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam::sync::WaitGroup;

use super::Connection;
use crate::config::Config;
use crate::error::Result;
use crate::protocol::{write_response, Response};
use crate::store::Store;

/// How long the accept loop sleeps when no client is waiting
const ACCEPT_POLL: Duration = Duration::from_millis(10);

/// Cloneable handle that stops a running [`Server`]
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// TCP server exposing a store's collections
pub struct Server<S> {
    config: Config,
    store: Arc<S>,
    listener: TcpListener,
    shutdown: ShutdownHandle,

    /// Live connection count, bounded by `config.max_connections`
    active: Arc<AtomicUsize>,
}

/// Decrements the live connection count when a connection thread ends
struct ActiveGuard(Arc<AtomicUsize>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl<S: Store + Send + Sync + 'static> Server<S> {
    /// Bind the listen address
    ///
    /// Binding happens here rather than in `run` so that callers can read
    /// the bound address (port 0) before serving.
    pub fn bind(config: Config, store: Arc<S>) -> Result<Self> {
        config.validate()?;

        let listener = TcpListener::bind(&config.listen_addr)?;
        listener.set_nonblocking(true)?;

        Ok(Self {
            config,
            store,
            listener,
            shutdown: ShutdownHandle {
                flag: Arc::new(AtomicBool::new(false)),
            },
            active: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Address the server is listening on
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Handle for stopping the server from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    /// Signal the server to shutdown gracefully
    pub fn shutdown(&self) {
        self.shutdown.shutdown();
    }

    /// Number of connections currently being served
    pub fn active_connections(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Start the server (blocking)
    ///
    /// Returns after shutdown once every connection thread has finished.
    /// Idle connections end at the configured read timeout.
    pub fn run(&self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr()?);

        let wait_group = WaitGroup::new();

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, addr)) => self.accept(stream, addr, wait_group.clone()),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!("Accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        tracing::info!(
            "Shutting down, waiting for {} connection(s)",
            self.active_connections()
        );
        wait_group.wait();
        Ok(())
    }

    fn accept(&self, stream: TcpStream, addr: SocketAddr, wait_group: WaitGroup) {
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Failed to configure stream from {}: {}", addr, e);
            return;
        }

        let active = self.active.fetch_add(1, Ordering::SeqCst);
        let guard = ActiveGuard(Arc::clone(&self.active));

        if active >= self.config.max_connections {
            tracing::warn!(
                "Rejecting {}: connection limit {} reached",
                addr,
                self.config.max_connections
            );
            let mut writer = BufWriter::new(stream);
            let _ = write_response(&mut writer, &Response::error("too many connections"));
            return;
        }

        let store = Arc::clone(&self.store);
        let read_timeout = self.config.read_timeout();
        let write_timeout = self.config.write_timeout();

        let spawned = thread::Builder::new()
            .name(format!("atlasmap-conn-{}", addr))
            .spawn(move || {
                let _guard = guard;
                let _wait_group = wait_group;

                let result = Connection::new(stream, store).and_then(|mut conn| {
                    conn.set_timeouts(read_timeout, write_timeout)?;
                    conn.handle()
                });
                if let Err(e) = result {
                    tracing::warn!("Connection {} ended with error: {}", addr, e);
                }
            });

        if let Err(e) = spawned {
            tracing::error!("Failed to spawn connection thread for {}: {}", addr, e);
        }
    }
}
