//! Lazy enumeration over a collection
//!
//! Field names are fetched one scan page at a time and decoded as they are
//! yielded. Any error, from the store or from decoding, ends the
//! iteration.

use std::collections::VecDeque;
use std::marker::PhantomData;

use super::TypedMap;
use crate::codec::{self, Storable};
use crate::error::Result;
use crate::store::{ScanCursor, Store};

/// Raw field names of one collection, page by page
struct FieldScan<'a, S> {
    store: &'a S,
    collection: &'a str,
    batch: usize,
    buffer: VecDeque<Vec<u8>>,

    /// None once the store reports the end (or after an error)
    cursor: Option<ScanCursor>,
}

impl<'a, S: Store> FieldScan<'a, S> {
    fn new(store: &'a S, collection: &'a str, batch: usize) -> Self {
        Self {
            store,
            collection,
            batch,
            buffer: VecDeque::new(),
            cursor: Some(ScanCursor::Start),
        }
    }

    /// End the enumeration; later calls yield None
    fn stop(&mut self) {
        self.cursor = None;
        self.buffer.clear();
    }

    /// Pass an item through, stopping on error
    fn fuse<T>(&mut self, item: Result<T>) -> Option<Result<T>> {
        if item.is_err() {
            self.stop();
        }
        Some(item)
    }
}

impl<S: Store> Iterator for FieldScan<'_, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(field) = self.buffer.pop_front() {
                return Some(Ok(field));
            }

            // Pages may be empty while the store still has more to give
            let cursor = self.cursor.take()?;
            match self.store.field_scan(self.collection, &cursor, self.batch) {
                Ok(page) => {
                    tracing::trace!(
                        collection = %self.collection,
                        fields = page.fields.len(),
                        done = page.next.is_none(),
                        "scan page"
                    );
                    self.buffer.extend(page.fields);
                    self.cursor = page.next;
                }
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

/// Iterator over the keys of a [`TypedMap`]
pub struct Keys<'a, S, K> {
    scan: FieldScan<'a, S>,
    _key: PhantomData<fn() -> K>,
}

impl<'a, S: Store, K: Storable> Keys<'a, S, K> {
    pub(super) fn new(store: &'a S, collection: &'a str, batch: usize) -> Self {
        Self {
            scan: FieldScan::new(store, collection, batch),
            _key: PhantomData,
        }
    }
}

impl<S: Store, K: Storable> Iterator for Keys<'_, S, K> {
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let key = self.scan.next()?.and_then(codec::decode_as);
        FieldScan::fuse(&mut self.scan, key)
    }
}

/// Iterator over the values of a [`TypedMap`]
pub struct Values<'a, S, K, V> {
    entries: Entries<'a, S, K, V>,
}

impl<'a, S: Store, K: Storable, V: Storable> Values<'a, S, K, V> {
    pub(super) fn new(map: &'a TypedMap<S, K, V>) -> Self {
        Self {
            entries: Entries::new(map),
        }
    }
}

impl<S: Store, K: Storable, V: Storable> Iterator for Values<'_, S, K, V> {
    type Item = Result<V>;

    fn next(&mut self) -> Option<Self::Item> {
        let (_, bytes) = match self.entries.next_raw()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };
        FieldScan::fuse(&mut self.entries.scan, codec::decode_as(bytes))
    }
}

/// Iterator over the `(key, value)` pairs of a [`TypedMap`]
pub struct Entries<'a, S, K, V> {
    scan: FieldScan<'a, S>,
    _types: PhantomData<fn() -> (K, V)>,
}

impl<'a, S: Store, K: Storable, V: Storable> Entries<'a, S, K, V> {
    pub(super) fn new(map: &'a TypedMap<S, K, V>) -> Self {
        Self {
            scan: FieldScan::new(&map.store, &map.name, map.scan_batch),
            _types: PhantomData,
        }
    }

    /// Next field that still has a value, undecoded
    fn next_raw(&mut self) -> Option<Result<(Vec<u8>, Vec<u8>)>> {
        loop {
            let field = match self.scan.next()? {
                Ok(field) => field,
                Err(e) => return Some(Err(e)),
            };

            match self.scan.store.field_get(self.scan.collection, &field) {
                Ok(Some(bytes)) => return Some(Ok((field, bytes))),
                // Deleted since it was enumerated
                Ok(None) => continue,
                Err(e) => {
                    self.scan.stop();
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<S: Store, K: Storable, V: Storable> Iterator for Entries<'_, S, K, V> {
    type Item = Result<(K, V)>;

    fn next(&mut self) -> Option<Self::Item> {
        let (field, bytes) = match self.next_raw()? {
            Ok(raw) => raw,
            Err(e) => return Some(Err(e)),
        };
        let entry = codec::decode_as(field).and_then(|key| Ok((key, codec::decode_as(bytes)?)));
        FieldScan::fuse(&mut self.scan, entry)
    }
}
