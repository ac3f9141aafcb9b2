//! AtlasMap Server Binary
//!
//! Serves in-memory collections over TCP.

use std::sync::Arc;

use atlasmap::network::Server;
use atlasmap::{Config, MemoryStore};
use clap::Parser;
use tracing_subscriber::{fmt, EnvFilter};

/// AtlasMap Server
#[derive(Parser, Debug)]
#[command(name = "atlasmap-server")]
#[command(about = "In-memory collection store for atlasmap typed maps")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7379")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "1024")]
    max_connections: usize,

    /// Idle read timeout per connection in milliseconds (0 = never)
    #[arg(long, default_value = "60000")]
    read_timeout_ms: u64,

    /// Write timeout per connection in milliseconds (0 = never)
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,atlasmap=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("AtlasMap Server v{}", atlasmap::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .write_timeout_ms(args.write_timeout_ms)
        .build();

    let store = Arc::new(MemoryStore::new());

    let server = match Server::bind(config, store) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
