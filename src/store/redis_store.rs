//! Redis-backed store
//!
//! A collection is a Redis hash; fields map to hash fields.

use parking_lot::Mutex;

use super::{ScanCursor, ScanPage, Store};
use crate::error::{MapError, Result};

/// Store over a single synchronous Redis connection
///
/// Enumeration uses `HSCAN`, which guarantees that fields present for the
/// whole scan are returned at least once; fields added or removed meanwhile
/// may or may not appear.
pub struct RedisStore {
    conn: Mutex<redis::Connection>,
}

impl RedisStore {
    /// Open a connection, e.g. `redis://127.0.0.1:6379/0`
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection()?;
        tracing::debug!("Connected to redis at {}", url);
        Ok(Self::from_connection(conn))
    }

    /// Wrap a caller-managed connection
    pub fn from_connection(conn: redis::Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl Store for RedisStore {
    fn field_get(&self, collection: &str, field: &[u8]) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.lock();
        Ok(redis::cmd("HGET")
            .arg(collection)
            .arg(field)
            .query(&mut *conn)?)
    }

    fn field_set(&self, collection: &str, field: &[u8], value: &[u8]) -> Result<()> {
        let mut conn = self.conn.lock();
        redis::cmd("HSET")
            .arg(collection)
            .arg(field)
            .arg(value)
            .query::<()>(&mut *conn)?;
        Ok(())
    }

    fn field_delete(&self, collection: &str, field: &[u8]) -> Result<bool> {
        let mut conn = self.conn.lock();
        let removed: i64 = redis::cmd("HDEL")
            .arg(collection)
            .arg(field)
            .query(&mut *conn)?;
        Ok(removed > 0)
    }

    fn field_exists(&self, collection: &str, field: &[u8]) -> Result<bool> {
        let mut conn = self.conn.lock();
        Ok(redis::cmd("HEXISTS")
            .arg(collection)
            .arg(field)
            .query(&mut *conn)?)
    }

    fn field_count(&self, collection: &str) -> Result<usize> {
        let mut conn = self.conn.lock();
        Ok(redis::cmd("HLEN").arg(collection).query(&mut *conn)?)
    }

    fn field_scan(
        &self,
        collection: &str,
        cursor: &ScanCursor,
        count: usize,
    ) -> Result<ScanPage> {
        let cursor = match cursor {
            ScanCursor::Start => 0,
            ScanCursor::Token(token) => std::str::from_utf8(token)
                .ok()
                .and_then(|t| t.parse::<u64>().ok())
                .ok_or_else(|| MapError::Protocol("invalid HSCAN cursor token".to_string()))?,
        };

        let mut conn = self.conn.lock();
        let (next, pairs): (u64, Vec<Vec<u8>>) = redis::cmd("HSCAN")
            .arg(collection)
            .arg(cursor)
            .arg("COUNT")
            .arg(count)
            .query(&mut *conn)?;

        // Reply alternates field, value
        let fields = pairs.into_iter().step_by(2).collect();
        let next = (next != 0).then(|| ScanCursor::Token(next.to_string().into_bytes()));
        Ok(ScanPage { fields, next })
    }

    fn collection_destroy(&self, collection: &str) -> Result<()> {
        let mut conn = self.conn.lock();
        redis::cmd("DEL").arg(collection).query::<()>(&mut *conn)?;
        Ok(())
    }
}
