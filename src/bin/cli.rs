//! AtlasMap CLI Client
//!
//! Command-line interface for inspecting collections on an atlasmap server.
//! Fields and values are treated as raw bytes and printed as lossy UTF-8,
//! which shows text and integer keys as written.
//!
//! A standalone binary over the public `RemoteStore` API; the library does
//! not depend on it.

use atlasmap::store::ScanCursor;
use atlasmap::{Config, RemoteStore, Result, Store};
use clap::{Parser, Subcommand};

/// AtlasMap CLI
#[derive(Parser, Debug)]
#[command(name = "atlasmap-cli")]
#[command(about = "CLI for atlasmap collection stores")]
struct Args {
    /// Server address
    #[arg(short, long, default_value = "127.0.0.1:7379")]
    server: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a field of a collection
    Get { collection: String, field: String },

    /// Set a field of a collection
    Set {
        collection: String,
        field: String,
        value: String,
    },

    /// Delete a field of a collection
    Del { collection: String, field: String },

    /// Check whether a field exists
    Exists { collection: String, field: String },

    /// Count the fields of a collection
    Len { collection: String },

    /// List the fields of a collection
    Keys {
        collection: String,

        /// Fields per scan page
        #[arg(long)]
        batch: Option<usize>,
    },

    /// Destroy a collection
    Drop { collection: String },

    /// Ping the server
    Ping,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder().listen_addr(&args.server);
    if let Commands::Keys {
        batch: Some(batch), ..
    } = args.command
    {
        builder = builder.scan_batch_size(batch);
    }
    let config = builder.build();
    config.validate()?;
    let store = RemoteStore::connect(&config)?;

    match args.command {
        Commands::Get { collection, field } => {
            match store.field_get(&collection, field.as_bytes())? {
                Some(value) => println!("{}", String::from_utf8_lossy(&value)),
                None => println!("(nil)"),
            }
        }
        Commands::Set {
            collection,
            field,
            value,
        } => {
            store.field_set(&collection, field.as_bytes(), value.as_bytes())?;
            println!("OK");
        }
        Commands::Del { collection, field } => {
            let removed = store.field_delete(&collection, field.as_bytes())?;
            println!("{}", removed as u8);
        }
        Commands::Exists { collection, field } => {
            let exists = store.field_exists(&collection, field.as_bytes())?;
            println!("{}", exists as u8);
        }
        Commands::Len { collection } => {
            println!("{}", store.field_count(&collection)?);
        }
        Commands::Keys { collection, .. } => {
            let mut cursor = ScanCursor::Start;
            loop {
                let page = store.field_scan(&collection, &cursor, config.scan_batch_size)?;
                for field in &page.fields {
                    println!("{}", String::from_utf8_lossy(field));
                }
                match page.next {
                    Some(next) => cursor = next,
                    None => break,
                }
            }
        }
        Commands::Drop { collection } => {
            store.collection_destroy(&collection)?;
            println!("OK");
        }
        Commands::Ping => {
            store.ping()?;
            println!("PONG");
        }
    }

    Ok(())
}
