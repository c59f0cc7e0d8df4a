//! Core types for the HTTP response cache.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Identity of an outgoing request, used as the cache lookup key.
///
/// Only the method and absolute URL take part; credentials and `Accept`
/// headers do not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestKey {
  pub method: String,
  pub url: String,
}

impl RequestKey {
  pub fn get(url: &str) -> Self {
    Self {
      method: "GET".to_string(),
      url: url.to_string(),
    }
  }

  /// SHA256 hash for stable, fixed-length keys.
  pub fn cache_hash(&self) -> String {
    let input = format!("{} {}", self.method.to_uppercase(), self.url);
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    hex::encode(hasher.finalize())
  }
}

/// The parts of an HTTP response the fetcher needs, in a form that can be
/// stored and replayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CachedResponse {
  pub status: u16,
  /// Raw `Link` header value
  pub link: Option<String>,
  /// Raw `X-RateLimit-Reset` header value
  pub rate_limit_reset: Option<String>,
  pub body: String,
}

/// Indicates where a response came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheSource {
  Network,
  Cache,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_cache_hash_is_stable() {
    let a = RequestKey::get("https://api.github.com/user/starred");
    let b = RequestKey::get("https://api.github.com/user/starred");
    assert_eq!(a.cache_hash(), b.cache_hash());
    assert_eq!(a.cache_hash().len(), 64);
  }

  #[test]
  fn test_cache_hash_differs_per_url() {
    let page1 = RequestKey::get("https://api.github.com/user/starred");
    let page2 = RequestKey::get("https://api.github.com/user/starred?page=2");
    assert_ne!(page1.cache_hash(), page2.cache_hash());
  }

  #[test]
  fn test_method_is_case_insensitive() {
    let upper = RequestKey::get("https://example.com");
    let lower = RequestKey {
      method: "get".to_string(),
      url: "https://example.com".to_string(),
    };
    assert_eq!(upper.cache_hash(), lower.cache_hash());
  }
}
