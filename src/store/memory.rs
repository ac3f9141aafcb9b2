//! In-memory store
//!
//! Collections held in process. Backs `atlasmap-server` and is the store of
//! choice for tests.

use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

use parking_lot::RwLock;

use super::{ScanCursor, ScanPage, Store};
use crate::error::Result;

type Collection = BTreeMap<Vec<u8>, Vec<u8>>;

/// Named collections of ordered fields
///
/// ## Concurrency:
/// - One RwLock over all collections; every command takes it once
/// - A collection whose last field is deleted is removed, so an empty
///   collection and an absent one are indistinguishable
///
/// ## Enumeration:
/// The scan cursor is the last field name returned. Each page resumes
/// strictly after it, so fields inserted ahead of the cursor during an
/// enumeration are seen and fields inserted behind it are not.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of non-empty collections
    pub fn collection_count(&self) -> usize {
        self.collections.read().len()
    }
}

impl Store for MemoryStore {
    fn field_get(&self, collection: &str, field: &[u8]) -> Result<Option<Vec<u8>>> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .and_then(|fields| fields.get(field))
            .cloned())
    }

    fn field_set(&self, collection: &str, field: &[u8], value: &[u8]) -> Result<()> {
        let mut collections = self.collections.write();
        collections
            .entry(collection.to_string())
            .or_default()
            .insert(field.to_vec(), value.to_vec());
        Ok(())
    }

    fn field_delete(&self, collection: &str, field: &[u8]) -> Result<bool> {
        let mut collections = self.collections.write();
        let Some(fields) = collections.get_mut(collection) else {
            return Ok(false);
        };

        let removed = fields.remove(field).is_some();
        if fields.is_empty() {
            collections.remove(collection);
        }
        Ok(removed)
    }

    fn field_exists(&self, collection: &str, field: &[u8]) -> Result<bool> {
        let collections = self.collections.read();
        Ok(collections
            .get(collection)
            .is_some_and(|fields| fields.contains_key(field)))
    }

    fn field_count(&self, collection: &str) -> Result<usize> {
        let collections = self.collections.read();
        Ok(collections.get(collection).map_or(0, |fields| fields.len()))
    }

    fn field_scan(
        &self,
        collection: &str,
        cursor: &ScanCursor,
        count: usize,
    ) -> Result<ScanPage> {
        let collections = self.collections.read();
        let Some(fields) = collections.get(collection) else {
            return Ok(ScanPage::default());
        };

        let lower = match cursor {
            ScanCursor::Start => Bound::Unbounded,
            ScanCursor::Token(last) => Bound::Excluded(last.clone()),
        };

        let count = count.max(1);
        let mut range = fields.range((lower, Bound::Unbounded)).map(|(k, _)| k);
        let page: Vec<Vec<u8>> = range.by_ref().take(count).cloned().collect();

        let next = match (range.next(), page.last()) {
            (Some(_), Some(last)) => Some(ScanCursor::Token(last.clone())),
            _ => None,
        };

        Ok(ScanPage { fields: page, next })
    }

    fn collection_destroy(&self, collection: &str) -> Result<()> {
        self.collections.write().remove(collection);
        Ok(())
    }
}
