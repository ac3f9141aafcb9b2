//! Configuration for AtlasMap
//!
//! Centralized configuration with sensible defaults. Shared by the store
//! server, the TCP client and `TypedMap::with_config`.

use std::time::Duration;

use crate::error::{MapError, Result};

/// Main configuration for AtlasMap
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address (server) or server address (client)
    pub listen_addr: String,

    /// Max concurrent client connections
    pub max_connections: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Client connect timeout (milliseconds, 0 = none)
    pub connect_timeout_ms: u64,

    // -------------------------------------------------------------------------
    // Map Configuration
    // -------------------------------------------------------------------------
    /// Number of field names requested per scan page during key iteration
    pub scan_batch_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "127.0.0.1:7379".to_string(),
            max_connections: 1024,
            read_timeout_ms: 5000,
            write_timeout_ms: 5000,
            connect_timeout_ms: 2000,
            scan_batch_size: 100,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check invariants that the builder cannot enforce by construction
    pub fn validate(&self) -> Result<()> {
        if self.listen_addr.is_empty() {
            return Err(MapError::Config("listen address is empty".to_string()));
        }
        if self.max_connections == 0 {
            return Err(MapError::Config(
                "max_connections must be at least 1".to_string(),
            ));
        }
        if self.scan_batch_size == 0 {
            return Err(MapError::Config(
                "scan_batch_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub(crate) fn read_timeout(&self) -> Option<Duration> {
        millis(self.read_timeout_ms)
    }

    pub(crate) fn write_timeout(&self) -> Option<Duration> {
        millis(self.write_timeout_ms)
    }

    pub(crate) fn connect_timeout(&self) -> Option<Duration> {
        millis(self.connect_timeout_ms)
    }
}

fn millis(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the TCP listen (or connect) address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the maximum number of concurrent connections
    pub fn max_connections(mut self, count: usize) -> Self {
        self.config.max_connections = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the connect timeout (in milliseconds)
    pub fn connect_timeout_ms(mut self, ms: u64) -> Self {
        self.config.connect_timeout_ms = ms;
        self
    }

    /// Set the scan page size used by map iteration
    pub fn scan_batch_size(mut self, count: usize) -> Self {
        self.config.scan_batch_size = count;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
