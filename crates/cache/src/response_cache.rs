use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Entries not read or written for this long are purged by maintenance.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 24 * 60 * 60);

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Keys match case-insensitively on the raw text.
pub fn normalize_key(key: &str) -> String {
    key.trim().to_lowercase()
}

/// Raw-input to decision cache backed by SQLite.
///
/// Timestamps are unix seconds. The `*_at` variants take the clock
/// explicitly; the plain variants use the wall clock.
#[derive(Debug)]
pub struct ResponseCache {
    conn: Mutex<Connection>,
}

impl ResponseCache {
    pub fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, CacheError> {
        if let Some(parent) = db_path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(db_path.as_ref())?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        tracing::info!("Response cache opened at {:?}", db_path.as_ref());
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, CacheError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, CacheError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS response_cache (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                last_accessed INTEGER NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_last_accessed ON response_cache(last_accessed)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, CacheError> {
        self.get_at(key, now())
    }

    /// Look up `key`; a hit refreshes its access time to `now`.
    pub fn get_at<T: DeserializeOwned>(
        &self,
        key: &str,
        now: i64,
    ) -> Result<Option<T>, CacheError> {
        let key = normalize_key(key);
        let conn = self.conn.lock();

        let value: Option<String> = conn
            .query_row(
                "SELECT value FROM response_cache WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;

        let Some(value) = value else {
            tracing::debug!("Cache miss: {:?}", key);
            return Ok(None);
        };

        // An unreadable entry keeps its old access time so eviction can reap it.
        let decoded = serde_json::from_str(&value)?;

        conn.execute(
            "UPDATE response_cache SET last_accessed = ?1 WHERE key = ?2",
            params![now, key],
        )?;
        tracing::debug!("Cache hit: {:?}", key);

        Ok(Some(decoded))
    }

    pub fn put<T: Serialize>(&self, key: &str, value: &T) -> Result<(), CacheError> {
        self.put_at(key, value, now())
    }

    /// Insert or silently replace the entry for `key`.
    pub fn put_at<T: Serialize>(&self, key: &str, value: &T, now: i64) -> Result<(), CacheError> {
        let key = normalize_key(key);
        let value = serde_json::to_string(value)?;
        let conn = self.conn.lock();

        conn.execute(
            "INSERT INTO response_cache (key, value, last_accessed) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, last_accessed = excluded.last_accessed",
            params![key, value, now],
        )?;

        Ok(())
    }

    pub fn evict_older_than(&self, retention: Duration) -> Result<usize, CacheError> {
        self.evict_older_than_at(retention, now())
    }

    /// Delete entries whose access time is strictly before `now - retention`.
    /// Entries exactly at the boundary are kept.
    pub fn evict_older_than_at(&self, retention: Duration, now: i64) -> Result<usize, CacheError> {
        let cutoff = now.saturating_sub(i64::try_from(retention.as_secs()).unwrap_or(i64::MAX));
        let conn = self.conn.lock();
        let removed = conn.execute(
            "DELETE FROM response_cache WHERE last_accessed < ?1",
            params![cutoff],
        )?;

        tracing::info!("Evicted {} cache entries older than {}", removed, cutoff);
        Ok(removed)
    }

    pub fn len(&self) -> Result<usize, CacheError> {
        let conn = self.conn.lock();
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM response_cache", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    pub fn is_empty(&self) -> Result<bool, CacheError> {
        Ok(self.len()? == 0)
    }

    /// Access time recorded for `key`, if present.
    pub fn last_accessed(&self, key: &str) -> Result<Option<i64>, CacheError> {
        let conn = self.conn.lock();
        let ts = conn
            .query_row(
                "SELECT last_accessed FROM response_cache WHERE key = ?1",
                params![normalize_key(key)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(ts)
    }
}

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}
