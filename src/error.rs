//! Error types for fetching and persisting starred repositories.

use reqwest::StatusCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StarredError {
  #[error("Configuration error: {0}")]
  Config(String),

  #[error("Request to {url} failed: {source}")]
  Transport {
    url: String,
    #[source]
    source: reqwest::Error,
  },

  /// GitHub answered 403. `reset` is the raw `X-RateLimit-Reset` value.
  #[error("Rate limited by GitHub API, reset at {}", .reset.as_deref().unwrap_or("unknown"))]
  RateLimited { reset: Option<String> },

  #[error("Unexpected status {status} from {url}")]
  UnexpectedStatus { status: StatusCode, url: String },

  #[error("Failed to decode response from {url}: {source}")]
  Decode {
    url: String,
    #[source]
    source: serde_json::Error,
  },

  #[error("Malformed Link header: {0}")]
  MalformedLink(String),

  /// A record could not be written. `position` is 1-based.
  #[error("Failed to save repository {position} (id {repo_id}, {stage}): {source}")]
  Persistence {
    position: usize,
    repo_id: i64,
    stage: &'static str,
    #[source]
    source: rusqlite::Error,
  },

  #[error("Database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("HTTP cache error: {0}")]
  Cache(String),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Cancelled")]
  Cancelled,

  #[error("No starred repositories returned for this token")]
  NoRepositories,
}

impl StarredError {
  /// The status code for `RateLimited` and `UnexpectedStatus` errors.
  #[cfg(test)]
  pub fn status(&self) -> Option<StatusCode> {
    match self {
      Self::RateLimited { .. } => Some(StatusCode::FORBIDDEN),
      Self::UnexpectedStatus { status, .. } => Some(*status),
      _ => None,
    }
  }
}

pub type Result<T> = std::result::Result<T, StarredError>;
