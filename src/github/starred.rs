//! Fetching every page of the authenticated user's starred repositories.

use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::CacheSource;
use crate::error::{Result, StarredError};

use super::cached_client::CachedGitHubClient;
use super::types::Repository;

pub const STARRED_URL: &str = "https://api.github.com/user/starred";
pub const ACCEPT_HEADER: &str = "application/vnd.github+json";

/// What to do with a `Link` header that doesn't parse.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
  /// Skip unparseable entries; pagination ends if no valid `next` remains
  #[default]
  Lenient,
  /// Fail the fetch
  Strict,
}

/// Options for one pagination run.
#[derive(Debug, Clone)]
pub struct FetchOptions {
  pub initial_url: String,
  /// Pause between pages
  pub request_delay: Duration,
  pub link_policy: LinkPolicy,
}

impl Default for FetchOptions {
  fn default() -> Self {
    Self {
      initial_url: STARRED_URL.to_string(),
      request_delay: Duration::ZERO,
      link_policy: LinkPolicy::default(),
    }
  }
}

/// Fetch all starred repositories, following `rel="next"` links until the
/// last page. Results are returned in page order.
///
/// A 403 stops immediately with `RateLimited`; any other non-200 with
/// `UnexpectedStatus`. Nothing is retried. Cancelling `cancel` abandons an
/// in-flight request or the wait between pages.
pub async fn fetch_all_starred(
  client: &CachedGitHubClient,
  options: &FetchOptions,
  cancel: &CancellationToken,
) -> Result<Vec<Repository>> {
  let mut all_repos = Vec::new();
  let mut url = options.initial_url.clone();
  let mut page = 1u32;

  loop {
    info!(page, %url, "Fetching page");

    let (response, source) = tokio::select! {
      _ = cancel.cancelled() => return Err(StarredError::Cancelled),
      result = client.get(&url) => result?,
    };

    match response.status {
      200 => {}
      403 => {
        return Err(StarredError::RateLimited {
          reset: response.rate_limit_reset,
        })
      }
      status => {
        return Err(StarredError::UnexpectedStatus {
          status: reqwest::StatusCode::from_u16(status)
            .unwrap_or(reqwest::StatusCode::INTERNAL_SERVER_ERROR),
          url,
        })
      }
    }

    let repos: Vec<Repository> =
      serde_json::from_str(&response.body).map_err(|source| StarredError::Decode {
        url: url.clone(),
        source,
      })?;
    let count = repos.len();
    all_repos.extend(repos);

    info!(
      page,
      count,
      total = all_repos.len(),
      cached = source == CacheSource::Cache,
      "Got repositories"
    );

    let next = match response.link.as_deref() {
      Some(header) => next_link(header, options.link_policy)?,
      None => None,
    };
    let Some(next) = next else {
      break;
    };

    page += 1;
    wait(options.request_delay, cancel).await?;
    url = next;
  }

  Ok(all_repos)
}

async fn wait(delay: Duration, cancel: &CancellationToken) -> Result<()> {
  if cancel.is_cancelled() {
    return Err(StarredError::Cancelled);
  }
  if delay.is_zero() {
    return Ok(());
  }

  tokio::select! {
    _ = cancel.cancelled() => Err(StarredError::Cancelled),
    _ = tokio::time::sleep(delay) => Ok(()),
  }
}

/// One `<url>; rel="..."` entry of a `Link` header.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LinkEntry {
  url: String,
  rels: Vec<String>,
}

/// Parse one comma-separated entry of a `Link` header.
fn parse_link_entry(part: &str) -> Option<LinkEntry> {
  let part = part.trim();
  let rest = part.strip_prefix('<')?;
  let (target, params) = rest.split_once('>')?;
  if target.is_empty() {
    return None;
  }

  let mut rels = Vec::new();
  for param in params.split(';').skip(1) {
    let (name, value) = param.trim().split_once('=')?;
    if name.trim().eq_ignore_ascii_case("rel") {
      let value = value.trim().trim_matches('"');
      rels.extend(value.split_whitespace().map(str::to_ascii_lowercase));
    }
  }
  if rels.is_empty() {
    return None;
  }

  // The first `;` must directly follow the closing `>`
  if !params.trim_start().starts_with(';') {
    return None;
  }

  url::Url::parse(target).ok()?;

  Some(LinkEntry {
    url: target.to_string(),
    rels,
  })
}

/// Split a `Link` header on the commas that separate entries. Commas inside
/// `<...>` belong to the URL.
fn split_link_entries(header: &str) -> impl Iterator<Item = &str> {
  let mut in_target = false;
  header.split(move |c: char| match c {
    '<' => {
      in_target = true;
      false
    }
    '>' => {
      in_target = false;
      false
    }
    ',' => !in_target,
    _ => false,
  })
}

/// Extract the `rel="next"` URL from a `Link` header.
///
/// Example header:
/// `<https://api.github.com/user/starred?page=2>; rel="next", <https://api.github.com/user/starred?page=34>; rel="last"`
fn next_link(header: &str, policy: LinkPolicy) -> Result<Option<String>> {
  let mut next = None;

  for part in split_link_entries(header).filter(|p| !p.trim().is_empty()) {
    match parse_link_entry(part) {
      Some(entry) => {
        if next.is_none() && entry.rels.iter().any(|r| r == "next") {
          next = Some(entry.url);
        }
      }
      None => match policy {
        LinkPolicy::Strict => return Err(StarredError::MalformedLink(header.to_string())),
        LinkPolicy::Lenient => warn!(entry = part.trim(), "Ignoring malformed Link entry"),
      },
    }
  }

  Ok(next)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::cache::CacheLayer;
  use crate::github::client::GitHubClient;
  use serde_json::json;
  use tempfile::TempDir;
  use wiremock::matchers::{method, path, query_param};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  fn repo(id: i64, owner_id: i64) -> serde_json::Value {
    json!({
      "id": id,
      "name": format!("repo-{}", id),
      "full_name": format!("owner/repo-{}", id),
      "owner": { "id": owner_id, "login": "owner" }
    })
  }

  fn client(cache: CacheLayer) -> CachedGitHubClient {
    let inner = GitHubClient::new("token", ACCEPT_HEADER).unwrap();
    CachedGitHubClient::new(inner, cache)
  }

  fn options(server: &MockServer) -> FetchOptions {
    FetchOptions {
      initial_url: format!("{}/user/starred", server.uri()),
      ..FetchOptions::default()
    }
  }

  fn ids(repos: &[Repository]) -> Vec<i64> {
    repos.iter().map(|r| r.id).collect()
  }

  #[test]
  fn test_next_link_github_header() {
    let header = "<https://api.github.com/user/starred?page=2>; rel=\"next\", \
                  <https://api.github.com/user/starred?page=34>; rel=\"last\"";
    assert_eq!(
      next_link(header, LinkPolicy::Strict).unwrap().as_deref(),
      Some("https://api.github.com/user/starred?page=2")
    );
  }

  #[test]
  fn test_next_link_absent_on_last_page() {
    let header = "<https://api.github.com/user/starred?page=1>; rel=\"prev\", \
                  <https://api.github.com/user/starred?page=1>; rel=\"first\"";
    assert_eq!(next_link(header, LinkPolicy::Strict).unwrap(), None);
  }

  #[test]
  fn test_next_link_not_first_entry() {
    let header = "<https://x.test/?page=1>; rel=\"prev\", <https://x.test/?page=3>; rel=\"next\"";
    assert_eq!(
      next_link(header, LinkPolicy::Lenient).unwrap().as_deref(),
      Some("https://x.test/?page=3")
    );
  }

  #[test]
  fn test_malformed_link_lenient_ends_pagination() {
    assert_eq!(
      next_link("https://x.test/?page=2; rel=\"next\"", LinkPolicy::Lenient).unwrap(),
      None
    );
    assert_eq!(next_link("garbage", LinkPolicy::Lenient).unwrap(), None);
  }

  #[test]
  fn test_next_link_keeps_commas_inside_url() {
    let header = "<https://x.test/?ids=1,2&page=2>; rel=\"next\", <https://x.test/?ids=1,2&page=9>; rel=\"last\"";
    assert_eq!(
      next_link(header, LinkPolicy::Strict).unwrap().as_deref(),
      Some("https://x.test/?ids=1,2&page=2")
    );
  }

  #[test]
  fn test_malformed_link_strict_fails() {
    assert!(matches!(
      next_link("<https://x.test/?page=2> rel=\"next\"", LinkPolicy::Strict),
      Err(StarredError::MalformedLink(_))
    ));
    assert!(matches!(
      next_link("<not a url>; rel=\"next\"", LinkPolicy::Strict),
      Err(StarredError::MalformedLink(_))
    ));
  }

  #[tokio::test]
  async fn test_two_pages_in_order() {
    let server = MockServer::start().await;
    let page2 = format!("{}/user/starred?page=2", server.uri());

    Mock::given(method("GET"))
      .and(path("/user/starred"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([repo(3, 10)])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .and(path("/user/starred"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([repo(1, 10), repo(2, 11)]))
          .insert_header("Link", format!("<{}>; rel=\"next\"", page2).as_str()),
      )
      .expect(1)
      .mount(&server)
      .await;

    let repos = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(ids(&repos), vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn test_empty_first_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(1)
      .mount(&server)
      .await;

    let repos = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(repos.is_empty());
  }

  #[tokio::test]
  async fn test_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(403).insert_header("X-RateLimit-Reset", "1372700873"))
      .expect(1)
      .mount(&server)
      .await;

    let err = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    match err {
      StarredError::RateLimited { reset } => assert_eq!(reset.as_deref(), Some("1372700873")),
      other => panic!("expected RateLimited, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn test_server_error_is_unexpected_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(500))
      .expect(1)
      .mount(&server)
      .await;

    let err = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StarredError::UnexpectedStatus { .. }));
    assert_eq!(err.status().map(|s| s.as_u16()), Some(500));
  }

  #[tokio::test]
  async fn test_error_on_second_page_discards_first() {
    let server = MockServer::start().await;
    let page2 = format!("{}/user/starred?page=2", server.uri());

    Mock::given(method("GET"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(502))
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([repo(1, 10)]))
          .insert_header("Link", format!("<{}>; rel=\"next\"", page2).as_str()),
      )
      .mount(&server)
      .await;

    let err = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(502));
  }

  #[tokio::test]
  async fn test_invalid_body_is_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(ResponseTemplate::new(200).set_body_string("{\"message\": \"nope\"}"))
      .mount(&server)
      .await;

    let err = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, StarredError::Decode { .. }));
  }

  #[tokio::test]
  async fn test_malformed_link_header_ends_pagination() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([repo(1, 10)]))
          .insert_header("Link", "page=2; next"),
      )
      .expect(1)
      .mount(&server)
      .await;

    let repos = fetch_all_starred(
      &client(CacheLayer::disabled()),
      &options(&server),
      &CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(ids(&repos), vec![1]);
  }

  #[tokio::test]
  async fn test_second_run_is_served_from_cache() {
    let server = MockServer::start().await;
    let page2 = format!("{}/user/starred?page=2", server.uri());

    Mock::given(method("GET"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([repo(2, 10)])))
      .expect(1)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([repo(1, 10)]))
          .insert_header("Link", format!("<{}>; rel=\"next\"", page2).as_str()),
      )
      .expect(1)
      .mount(&server)
      .await;

    let dir = TempDir::new().unwrap();
    let client = client(CacheLayer::open(dir.path(), 5).unwrap());
    let cancel = CancellationToken::new();

    let first = fetch_all_starred(&client, &options(&server), &cancel)
      .await
      .unwrap();
    let second = fetch_all_starred(&client, &options(&server), &cancel)
      .await
      .unwrap();

    assert_eq!(ids(&first), vec![1, 2]);
    assert_eq!(first, second);
  }

  #[tokio::test]
  async fn test_cancel_interrupts_delay() {
    let server = MockServer::start().await;
    let page2 = format!("{}/user/starred?page=2", server.uri());

    Mock::given(method("GET"))
      .and(query_param("page", "2"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
      .expect(0)
      .mount(&server)
      .await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([repo(1, 10)]))
          .insert_header("Link", format!("<{}>; rel=\"next\"", page2).as_str()),
      )
      .expect(1)
      .mount(&server)
      .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(50)).await;
      trigger.cancel();
    });

    let options = FetchOptions {
      request_delay: Duration::from_secs(60),
      ..options(&server)
    };
    let started = std::time::Instant::now();
    let err = fetch_all_starred(&client(CacheLayer::disabled()), &options, &cancel)
      .await
      .unwrap_err();

    assert!(matches!(err, StarredError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(30));
  }

  #[tokio::test]
  async fn test_cancel_abandons_slow_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!([repo(1, 10)]))
          .set_delay(Duration::from_secs(5)),
      )
      .mount(&server)
      .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
      tokio::time::sleep(Duration::from_millis(50)).await;
      trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = fetch_all_starred(&client(CacheLayer::disabled()), &options(&server), &cancel)
      .await
      .unwrap_err();

    assert!(matches!(err, StarredError::Cancelled));
    assert!(started.elapsed() < Duration::from_secs(2));
  }
}
