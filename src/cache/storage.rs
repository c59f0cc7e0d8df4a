//! Cache storage trait and SQLite implementation.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use crate::error::{Result, StarredError};

/// A single stored value together with its insertion time.
#[derive(Debug, Clone)]
pub struct CachedEntry {
  pub data: Vec<u8>,
  pub cached_at: DateTime<Utc>,
}

/// Trait for cache storage backends: a plain key-value store whose entries
/// carry the time they were written.
pub trait CacheStorage: Send + Sync {
  fn get(&self, key: &str) -> Result<Option<CachedEntry>>;

  /// Store `data` under `key`, replacing any previous entry.
  fn set(&self, key: &str, data: &[u8], cached_at: DateTime<Utc>) -> Result<()>;

  fn delete(&self, key: &str) -> Result<()>;
}

/// Storage implementation that doesn't cache anything.
/// Used when caching is disabled - all operations are no-ops.
pub struct NoopStorage;

impl CacheStorage for NoopStorage {
  fn get(&self, _key: &str) -> Result<Option<CachedEntry>> {
    Ok(None) // Always miss
  }

  fn set(&self, _key: &str, _data: &[u8], _cached_at: DateTime<Utc>) -> Result<()> {
    Ok(()) // Discard
  }

  fn delete(&self, _key: &str) -> Result<()> {
    Ok(())
  }
}

/// File name of the cache database inside the cache directory.
const CACHE_FILE: &str = "http-cache.db";

/// SQLite-based cache storage implementation.
pub struct SqliteStorage {
  conn: Mutex<Connection>,
}

impl SqliteStorage {
  /// Open (or create) the cache database inside `dir`.
  pub fn open(dir: &Path) -> Result<Self> {
    std::fs::create_dir_all(dir).map_err(|e| {
      StarredError::Cache(format!(
        "Failed to create cache directory {}: {}",
        dir.display(),
        e
      ))
    })?;

    let path = dir.join(CACHE_FILE);
    let conn = Connection::open(&path).map_err(|e| {
      StarredError::Cache(format!(
        "Failed to open cache database at {}: {}",
        path.display(),
        e
      ))
    })?;

    let storage = Self {
      conn: Mutex::new(conn),
    };
    storage.run_migrations()?;

    Ok(storage)
  }

  fn run_migrations(&self) -> Result<()> {
    let conn = self.lock()?;
    conn
      .execute_batch(CACHE_SCHEMA)
      .map_err(|e| StarredError::Cache(format!("Failed to run cache migrations: {}", e)))
  }

  fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
    self
      .conn
      .lock()
      .map_err(|e| StarredError::Cache(format!("Lock poisoned: {}", e)))
  }
}

/// Schema for cache tables.
const CACHE_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS http_cache (
    cache_key TEXT PRIMARY KEY,
    data BLOB NOT NULL,
    cached_at TEXT NOT NULL
);
"#;

impl CacheStorage for SqliteStorage {
  fn get(&self, key: &str) -> Result<Option<CachedEntry>> {
    let conn = self.lock()?;

    let row: Option<(Vec<u8>, String)> = conn
      .query_row(
        "SELECT data, cached_at FROM http_cache WHERE cache_key = ?",
        params![key],
        |row| Ok((row.get(0)?, row.get(1)?)),
      )
      .optional()
      .map_err(|e| StarredError::Cache(format!("Failed to read cache entry: {}", e)))?;

    match row {
      Some((data, cached_at_str)) => Ok(Some(CachedEntry {
        data,
        cached_at: parse_datetime(&cached_at_str)?,
      })),
      None => Ok(None),
    }
  }

  fn set(&self, key: &str, data: &[u8], cached_at: DateTime<Utc>) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute(
        "INSERT OR REPLACE INTO http_cache (cache_key, data, cached_at) VALUES (?, ?, ?)",
        params![key, data, cached_at.to_rfc3339()],
      )
      .map_err(|e| StarredError::Cache(format!("Failed to store cache entry: {}", e)))?;

    Ok(())
  }

  fn delete(&self, key: &str) -> Result<()> {
    let conn = self.lock()?;

    conn
      .execute("DELETE FROM http_cache WHERE cache_key = ?", params![key])
      .map_err(|e| StarredError::Cache(format!("Failed to evict cache entry: {}", e)))?;

    Ok(())
  }
}

/// Parse a timestamp written by `SqliteStorage::set`.
fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| StarredError::Cache(format!("Failed to parse datetime '{}': {}", s, e)))
}
