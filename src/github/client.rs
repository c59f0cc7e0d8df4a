// GitHub API HTTP client.
// Handles authentication headers and turns responses into replayable values.

use reqwest::{
  header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, LINK},
  Client, Response,
};
use std::time::Duration;
use tracing::debug;

use crate::cache::CachedResponse;
use crate::error::{Result, StarredError};

const USER_AGENT: &str = concat!("mygithub/", env!("CARGO_PKG_VERSION"));
const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";
/// Upper bound for one request, body included.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Authenticated GitHub client. Every request carries the bearer token and
/// the configured `Accept` header.
#[derive(Clone)]
pub struct GitHubClient {
  client: Client,
}

impl GitHubClient {
  pub fn new(token: &str, accept: &str) -> Result<Self> {
    if token.trim().is_empty() {
      return Err(StarredError::Config(
        "GitHub access token must not be empty".to_string(),
      ));
    }

    let mut headers = HeaderMap::new();

    let mut auth = HeaderValue::from_str(&format!("Bearer {}", token))
      .map_err(|e| StarredError::Config(format!("Invalid access token: {}", e)))?;
    auth.set_sensitive(true);
    headers.insert(AUTHORIZATION, auth);
    headers.insert(
      ACCEPT,
      HeaderValue::from_str(accept)
        .map_err(|e| StarredError::Config(format!("Invalid Accept header: {}", e)))?,
    );

    let client = Client::builder()
      .default_headers(headers)
      .user_agent(USER_AGENT)
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(|e| StarredError::Config(format!("Failed to build HTTP client: {}", e)))?;

    Ok(Self { client })
  }

  /// Issue a GET request. Any status is returned as-is; classifying it is
  /// up to the caller.
  pub async fn get(&self, url: &str) -> Result<CachedResponse> {
    debug!(url, "GET");

    let response = self
      .client
      .get(url)
      .send()
      .await
      .map_err(|source| StarredError::Transport {
        url: url.to_string(),
        source,
      })?;

    into_cached(url, response).await
  }
}

async fn into_cached(url: &str, response: Response) -> Result<CachedResponse> {
  let status = response.status().as_u16();
  let link = header_string(&response, LINK.as_str());
  let rate_limit_reset = header_string(&response, RATE_LIMIT_RESET);

  let body = response
    .text()
    .await
    .map_err(|source| StarredError::Transport {
      url: url.to_string(),
      source,
    })?;

  Ok(CachedResponse {
    status,
    link,
    rate_limit_reset,
    body,
  })
}

fn header_string(response: &Response, name: &str) -> Option<String> {
  response
    .headers()
    .get(name)
    .and_then(|v| v.to_str().ok())
    .map(String::from)
}
