//! Store Module
//!
//! The remote associative store that typed maps are built on: named
//! collections of `field -> bytes` pairs.
//!
//! ## Commands
//! - field-read / field-write / field-delete / field-exists
//! - field-count
//! - field-enumerate (paginated by [`ScanCursor`])
//! - collection-destroy
//!
//! Every method issues exactly one command. Implementations give
//! single-field atomicity only; nothing here spans commands.
//!
//! ## Implementations
//! - [`MemoryStore`]: in-process collections, also what the server hosts
//! - [`RemoteStore`]: TCP client for `atlasmap-server`
//! - `RedisStore`: Redis hashes (feature `redis`)

mod memory;
mod remote;
#[cfg(feature = "redis")]
mod redis_store;

pub use memory::MemoryStore;
pub use remote::RemoteStore;
#[cfg(feature = "redis")]
pub use redis_store::RedisStore;

use std::sync::Arc;

use crate::error::Result;

/// Position within a field enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCursor {
    /// Begin a new enumeration
    Start,

    /// Store-specific continuation token from a previous page
    Token(Vec<u8>),
}

/// One page of a field enumeration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanPage {
    /// Field names in this page (may be empty even when more follow)
    pub fields: Vec<Vec<u8>>,

    /// Where to continue, or None once the enumeration is complete
    pub next: Option<ScanCursor>,
}

/// A remote store keyed by (collection, field) with byte-string values
pub trait Store {
    /// Read a field; None if the field or collection is absent
    fn field_get(&self, collection: &str, field: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Create or overwrite a field
    fn field_set(&self, collection: &str, field: &[u8], value: &[u8]) -> Result<()>;

    /// Remove a field; returns whether it existed
    fn field_delete(&self, collection: &str, field: &[u8]) -> Result<bool>;

    /// Check whether a field exists
    fn field_exists(&self, collection: &str, field: &[u8]) -> Result<bool>;

    /// Number of fields in a collection (0 if absent)
    fn field_count(&self, collection: &str) -> Result<usize>;

    /// Fetch up to roughly `count` field names starting at `cursor`
    fn field_scan(&self, collection: &str, cursor: &ScanCursor, count: usize)
        -> Result<ScanPage>;

    /// Destroy a collection and all of its fields
    fn collection_destroy(&self, collection: &str) -> Result<()>;
}

macro_rules! forward_store {
    ($($ptr:ty),*) => {
        $(
            impl<S: Store + ?Sized> Store for $ptr {
                fn field_get(&self, collection: &str, field: &[u8]) -> Result<Option<Vec<u8>>> {
                    (**self).field_get(collection, field)
                }

                fn field_set(&self, collection: &str, field: &[u8], value: &[u8]) -> Result<()> {
                    (**self).field_set(collection, field, value)
                }

                fn field_delete(&self, collection: &str, field: &[u8]) -> Result<bool> {
                    (**self).field_delete(collection, field)
                }

                fn field_exists(&self, collection: &str, field: &[u8]) -> Result<bool> {
                    (**self).field_exists(collection, field)
                }

                fn field_count(&self, collection: &str) -> Result<usize> {
                    (**self).field_count(collection)
                }

                fn field_scan(
                    &self,
                    collection: &str,
                    cursor: &ScanCursor,
                    count: usize,
                ) -> Result<ScanPage> {
                    (**self).field_scan(collection, cursor, count)
                }

                fn collection_destroy(&self, collection: &str) -> Result<()> {
                    (**self).collection_destroy(collection)
                }
            }
        )*
    };
}

forward_store!(&S, Arc<S>, Box<S>);
