//! # AtlasMap
//!
//! Typed key-value maps over a remote collection store:
//! - Canonical byte codec for bytes, text, integers, floats and flat records
//! - `TypedMap` handles with get/set/delete/contains/len/iterate/clear
//! - Pluggable stores: in-memory, TCP (`atlasmap-server`), Redis (feature)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TypedMap<S, K, V>  (handle)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ K, V
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                        Codec                                 │
//! │          record │ bytes │ text │ int │ float                 │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ field, bytes
//!          ┌────────────┼─────────────────┐
//!          │            │                 │
//!          ▼            ▼                 ▼
//!   ┌─────────────┐ ┌─────────────┐ ┌─────────────┐
//!   │ MemoryStore │ │ RemoteStore │ │ RedisStore  │
//!   │  (RwLock)   │ │    (TCP)    │ │  (feature)  │
//!   └─────────────┘ └──────┬──────┘ └─────────────┘
//!                          │
//!                          ▼
//!                  ┌───────────────┐
//!                  │atlasmap-server│
//!                  │ (MemoryStore) │
//!                  └───────────────┘
//! ```
//!
//! The library keeps no state of its own and never retries: every map
//! operation is one store command, except iteration, which pages through
//! the collection without any isolation from concurrent writers.

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;

pub mod codec;
pub mod map;
pub mod network;
pub mod protocol;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::{Kind, Record, Storable, Value};
pub use config::Config;
pub use error::{MapError, Result};
pub use map::TypedMap;
pub use store::{MemoryStore, RemoteStore, Store};

#[cfg(feature = "redis")]
pub use store::RedisStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of AtlasMap
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
