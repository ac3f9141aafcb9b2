//! Map Module
//!
//! Typed map handles over store collections.
//!
//! ## Data Flow
//! ```text
//!   K, V ──encode──► field, bytes ──► Store command ──► bytes ──decode──► V
//! ```
//!
//! A handle owns no data. Any number of handles, in any number of
//! processes, may share one collection; the store orders commands per field
//! and nothing more. Bytes carry no type tag, so a handle reading a field
//! written through a handle with different types gets a decode error or a
//! wrong value.

mod iter;

pub use iter::{Entries, Keys, Values};

use std::fmt;
use std::marker::PhantomData;

use crate::codec::{self, Storable, Value};
use crate::config::Config;
use crate::error::{MapError, Result};
use crate::store::Store;

/// Default number of field names fetched per scan page
pub const DEFAULT_SCAN_BATCH: usize = 100;

/// Typed view over one named collection
///
/// `K` and `V` are fixed at construction and only select the decode path.
///
/// ```
/// use atlasmap::{MemoryStore, TypedMap};
///
/// let store = MemoryStore::new();
/// let scores: TypedMap<_, String, i64> = TypedMap::new(&store, "scores");
///
/// scores.set(&"alice".to_string(), &3)?;
/// assert_eq!(scores.get(&"alice".to_string())?, 3);
/// assert_eq!(scores.len()?, 1);
/// # Ok::<(), atlasmap::MapError>(())
/// ```
pub struct TypedMap<S, K, V> {
    store: S,
    name: String,
    scan_batch: usize,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<S, K, V> TypedMap<S, K, V>
where
    S: Store,
    K: Storable,
    V: Storable,
{
    /// Bind a handle to the collection `name` in `store`
    pub fn new(store: S, name: impl Into<String>) -> Self {
        Self {
            store,
            name: name.into(),
            scan_batch: DEFAULT_SCAN_BATCH,
            _types: PhantomData,
        }
    }

    /// Bind a handle using the scan batch size from `config`
    pub fn with_config(store: S, name: impl Into<String>, config: &Config) -> Self {
        Self::new(store, name).scan_batch(config.scan_batch_size)
    }

    /// Set how many field names each scan page requests
    pub fn scan_batch(mut self, count: usize) -> Self {
        self.scan_batch = count.max(1);
        self
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Get the value for `key`
    ///
    /// Fails with `KeyNotFound` if the field is absent.
    pub fn get(&self, key: &K) -> Result<V> {
        self.get_optional(key)?.ok_or(MapError::KeyNotFound)
    }

    /// Get the value for `key`, or None if absent
    pub fn get_optional(&self, key: &K) -> Result<Option<V>> {
        let field = codec::encode_as(key)?;
        tracing::trace!(collection = %self.name, "field read");

        match self.store.field_get(&self.name, &field)? {
            Some(bytes) => codec::decode_as(bytes).map(Some),
            None => Ok(None),
        }
    }

    /// Create or overwrite the value for `key`
    ///
    /// Both key and value are encoded before the store is touched.
    pub fn set(&self, key: &K, value: &V) -> Result<()> {
        let field = codec::encode_as(key)?;
        let bytes = codec::encode_as(value)?;
        tracing::trace!(collection = %self.name, len = bytes.len(), "field write");

        self.store.field_set(&self.name, &field, &bytes)
    }

    /// Remove `key`; removing an absent key is not an error
    pub fn delete(&self, key: &K) -> Result<()> {
        let field = codec::encode_as(key)?;
        let removed = self.store.field_delete(&self.name, &field)?;
        tracing::trace!(collection = %self.name, removed, "field delete");
        Ok(())
    }

    /// Check whether `key` is present
    pub fn contains(&self, key: &K) -> Result<bool> {
        let field = codec::encode_as(key)?;
        self.store.field_exists(&self.name, &field)
    }

    /// Membership test for an untyped key
    ///
    /// A value of a different kind than `K` is never present; no command is
    /// issued for it.
    pub fn contains_value(&self, key: &Value) -> Result<bool> {
        if key.kind() != K::KIND {
            return Ok(false);
        }
        let field = codec::encode(key.clone())?;
        self.store.field_exists(&self.name, &field)
    }

    /// Number of entries in the collection
    pub fn len(&self) -> Result<usize> {
        self.store.field_count(&self.name)
    }

    /// Whether the collection has no entries
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Lazily enumerate keys, decoding each on demand
    ///
    /// The sequence is fetched page by page and is weakly consistent: writes
    /// made while it runs may or may not be observed. Each call starts a new
    /// enumeration.
    pub fn keys(&self) -> Keys<'_, S, K> {
        Keys::new(&self.store, &self.name, self.scan_batch)
    }

    /// Lazily enumerate values
    ///
    /// Each value is read when its key is reached; keys deleted in between
    /// are skipped.
    pub fn values(&self) -> Values<'_, S, K, V> {
        Values::new(self)
    }

    /// Lazily enumerate `(key, value)` pairs, same consistency as [`values`](Self::values)
    pub fn entries(&self) -> Entries<'_, S, K, V> {
        Entries::new(self)
    }

    /// Destroy the whole collection, including entries written by other handles
    pub fn clear(&self) -> Result<()> {
        tracing::debug!(collection = %self.name, "destroying collection");
        self.store.collection_destroy(&self.name)
    }
}

impl<S, K, V> fmt::Debug for TypedMap<S, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedMap")
            .field("name", &self.name)
            .field("key", &std::any::type_name::<K>())
            .field("value", &std::any::type_name::<V>())
            .finish()
    }
}
