//! SQLite-backed metadata cache.
//!
//! Holds the raw catalog record of each extracted database so a later run
//! can skip the catalog read. Lives in `~/.ontomap/cache.db` unless the
//! config names another file.
//!
//! # Layout
//!
//! ```text
//! entries(key, value, stored_at)    value is JSON, stored_at RFC 3339 (UTC, µs)
//! cache_meta(name, value)           holds the schema version
//! ```
//!
//! Entries never expire; `extract --refresh` bypasses them and
//! `ontomap cache clear` drops them. A schema version mismatch empties the
//! cache on open.
//!
//! # Keys
//!
//! ```text
//! {target_hash}:raw:{database}   -> RawDatabaseRecord
//! ```
//!
//! `target_hash` is a short hash of `(host, port, name)`, so moving a
//! database to another server never serves stale rows.

mod hash;
pub use hash::{compute_hash, short_hash, SHORT_HASH_LEN};

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info};

use crate::config::DatabaseSettings;

/// Bumped whenever the stored layout or record shape changes.
const CACHE_VERSION: i32 = 2;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Cached value is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cannot locate a home directory for the cache")]
    NoCacheDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// A cached value and when it was written.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedEntry<T> {
    pub value: T,
    pub stored_at: DateTime<Utc>,
}

/// Size and age summary of the cache.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheStats {
    pub entry_count: usize,
    /// Bytes of JSON held across all entries
    pub total_size_bytes: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

pub struct MetadataCache {
    conn: Connection,
}

impl MetadataCache {
    /// Open the cache at its default location.
    pub fn open() -> CacheResult<Self> {
        Self::open_at(Self::default_path()?)
    }

    /// Open or create a cache file, creating parent directories as needed.
    pub fn open_at(path: impl AsRef<Path>) -> CacheResult<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let cache = Self::with_connection(Connection::open(path)?)?;
        debug!(path = %path.display(), "Opened metadata cache");
        Ok(cache)
    }

    pub fn open_in_memory() -> CacheResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    /// `~/.ontomap/cache.db`
    pub fn default_path() -> CacheResult<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".ontomap").join("cache.db"))
            .ok_or(CacheError::NoCacheDir)
    }

    fn with_connection(conn: Connection) -> CacheResult<Self> {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS cache_meta (
                 name  TEXT PRIMARY KEY,
                 value TEXT NOT NULL
             );
             CREATE TABLE IF NOT EXISTS entries (
                 key       TEXT PRIMARY KEY,
                 value     TEXT NOT NULL,
                 stored_at TEXT NOT NULL
             );",
        )?;

        let cache = Self { conn };
        match cache.stored_version()? {
            Some(version) if version == CACHE_VERSION => {}
            stored => {
                if let Some(version) = stored {
                    info!(
                        stored = version,
                        current = CACHE_VERSION,
                        "Cache layout changed, clearing"
                    );
                }
                cache.clear_all()?;
                cache.conn.execute(
                    "INSERT OR REPLACE INTO cache_meta (name, value) VALUES ('version', ?1)",
                    params![CACHE_VERSION.to_string()],
                )?;
            }
        }
        Ok(cache)
    }

    fn stored_version(&self) -> CacheResult<Option<i32>> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM cache_meta WHERE name = 'version'",
                [],
                |row| row.get(0),
            )
            .optional()?;
        // An unreadable version counts as a mismatch
        Ok(raw.map(|v| v.parse().unwrap_or(0)))
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        Ok(self.get_entry(key)?.map(|entry| entry.value))
    }

    /// Like [`get`](Self::get), with the time the value was written.
    pub fn get_entry<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<CachedEntry<T>>> {
        let row: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT value, stored_at FROM entries WHERE key = ?1",
                params![key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((json, stored_at)) = row else {
            return Ok(None);
        };
        Ok(Some(CachedEntry {
            value: serde_json::from_str(&json)?,
            stored_at: parse_timestamp(&stored_at).unwrap_or_default(),
        }))
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> CacheResult<()> {
        let json = serde_json::to_string(value)?;
        let stored_at = Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        self.conn.execute(
            "INSERT OR REPLACE INTO entries (key, value, stored_at) VALUES (?1, ?2, ?3)",
            params![key, json, stored_at],
        )?;
        Ok(())
    }

    /// Returns whether an entry was removed.
    pub fn delete(&self, key: &str) -> CacheResult<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(removed > 0)
    }

    /// Remove every entry whose key starts with `prefix`.
    ///
    /// Matching is literal, so `_` and `%` in database names are safe.
    pub fn delete_prefix(&self, prefix: &str) -> CacheResult<usize> {
        let removed = self.conn.execute(
            "DELETE FROM entries WHERE substr(key, 1, length(?1)) = ?1",
            params![prefix],
        )?;
        Ok(removed)
    }

    pub fn clear_all(&self) -> CacheResult<usize> {
        Ok(self.conn.execute("DELETE FROM entries", [])?)
    }

    /// Drop everything cached for one database location.
    pub fn clear_target(&self, target_hash: &str) -> CacheResult<usize> {
        self.delete_prefix(&format!("{}:", target_hash))
    }

    /// Keys starting with `prefix`, in key order.
    pub fn keys_with_prefix(&self, prefix: &str) -> CacheResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT key FROM entries WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )?;
        let keys = stmt
            .query_map(params![prefix], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(keys)
    }

    pub fn stats(&self) -> CacheResult<CacheStats> {
        let (count, size, oldest, newest): (i64, i64, Option<String>, Option<String>) =
            self.conn.query_row(
                "SELECT COUNT(*), COALESCE(SUM(LENGTH(value)), 0), MIN(stored_at), MAX(stored_at)
                 FROM entries",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;

        Ok(CacheStats {
            entry_count: count as usize,
            total_size_bytes: size as usize,
            oldest: oldest.as_deref().and_then(parse_timestamp),
            newest: newest.as_deref().and_then(parse_timestamp),
        })
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|ts| ts.with_timezone(&Utc))
}

/// Cache key construction.
pub struct CacheKey;

impl CacheKey {
    /// Hash identifying where a database lives.
    pub fn target(db: &DatabaseSettings) -> CacheResult<String> {
        Ok(short_hash(&(&db.host, db.port, &db.name))?)
    }

    /// Key of a database's raw catalog record.
    pub fn raw(target_hash: &str, database: &str) -> String {
        format!("{}:raw:{}", target_hash, database)
    }
}
