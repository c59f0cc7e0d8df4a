//! Cache layer that applies a time-to-live policy on top of a storage backend.

use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

use super::storage::{CacheStorage, NoopStorage, SqliteStorage};
use super::traits::{CachedResponse, RequestKey};
use crate::error::{Result, StarredError};

/// Cache layer that serves stored responses while they are younger than the
/// TTL and evicts them as soon as a lookup finds them stale.
pub struct CacheLayer {
  storage: Arc<dyn CacheStorage>,
  /// How long before a cached response is considered stale
  ttl: Duration,
}

impl CacheLayer {
  /// Create a new cache layer with the given storage backend.
  pub fn new(storage: impl CacheStorage + 'static, ttl: Duration) -> Self {
    Self {
      storage: Arc::new(storage),
      ttl,
    }
  }

  /// A cache layer that never stores anything.
  pub fn disabled() -> Self {
    Self::new(NoopStorage, Duration::zero())
  }

  /// Build the cache from CLI options. A TTL of zero minutes disables it.
  pub fn open(dir: &Path, ttl_minutes: u64) -> Result<Self> {
    if ttl_minutes == 0 {
      debug!("HTTP cache disabled");
      return Ok(Self::disabled());
    }

    let minutes = i64::try_from(ttl_minutes)
      .ok()
      .and_then(Duration::try_minutes)
      .ok_or_else(|| StarredError::Config(format!("Cache duration too large: {}", ttl_minutes)))?;
    debug!(dir = %dir.display(), ttl_minutes, "HTTP cache enabled");

    Self::with_ttl(dir, minutes)
  }

  /// SQLite-backed cache in `dir` with an explicit TTL.
  pub fn with_ttl(dir: &Path, ttl: Duration) -> Result<Self> {
    Ok(Self::new(SqliteStorage::open(dir)?, ttl))
  }

  fn is_stale(&self, cached_at: DateTime<Utc>) -> bool {
    Utc::now() - cached_at > self.ttl
  }

  /// Look up a response. Stale or unreadable entries are evicted and
  /// reported as a miss.
  pub fn get(&self, key: &RequestKey) -> Result<Option<CachedResponse>> {
    let hash = key.cache_hash();

    let Some(entry) = self.storage.get(&hash)? else {
      return Ok(None);
    };

    if self.is_stale(entry.cached_at) {
      debug!(url = %key.url, cached_at = %entry.cached_at, "Evicting stale cache entry");
      self.storage.delete(&hash)?;
      return Ok(None);
    }

    match serde_json::from_slice(&entry.data) {
      Ok(response) => Ok(Some(response)),
      Err(e) => {
        warn!(url = %key.url, "Discarding unreadable cache entry: {}", e);
        self.storage.delete(&hash)?;
        Ok(None)
      }
    }
  }

  /// Store a response, stamped with the current time.
  pub fn set(&self, key: &RequestKey, response: &CachedResponse) -> Result<()> {
    let data = serde_json::to_vec(response)
      .map_err(|e| StarredError::Cache(format!("Failed to serialize response: {}", e)))?;
    self.storage.set(&key.cache_hash(), &data, Utc::now())
  }
}

impl Clone for CacheLayer {
  fn clone(&self) -> Self {
    Self {
      storage: Arc::clone(&self.storage),
      ttl: self.ttl,
    }
  }
}
