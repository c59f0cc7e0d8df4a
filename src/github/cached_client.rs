//! GitHub client that wraps GitHubClient with transparent response caching.

use tracing::debug;

use crate::cache::{CacheLayer, CacheSource, CachedResponse, RequestKey};
use crate::error::Result;

use super::client::GitHubClient;

/// GitHub client with transparent caching support.
///
/// Successful responses are stored in the cache layer. Error responses are
/// never stored, so a rate-limited request is retried for real next time.
#[derive(Clone)]
pub struct CachedGitHubClient {
  inner: GitHubClient,
  cache: CacheLayer,
}

impl CachedGitHubClient {
  pub fn new(inner: GitHubClient, cache: CacheLayer) -> Self {
    Self { inner, cache }
  }

  /// GET `url`, serving it from the cache when a fresh entry exists.
  pub async fn get(&self, url: &str) -> Result<(CachedResponse, CacheSource)> {
    let key = RequestKey::get(url);

    if let Some(cached) = self.cache.get(&key)? {
      debug!(url, "Cache hit");
      return Ok((cached, CacheSource::Cache));
    }

    debug!(url, "Cache miss");
    let response = self.inner.get(url).await?;
    if response.status == 200 {
      self.cache.set(&key, &response)?;
    }

    Ok((response, CacheSource::Network))
  }
}
