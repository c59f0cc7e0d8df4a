use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::cache::CacheLayer;
use crate::config::Settings;
use crate::db::repositories::SaveSummary;
use crate::db::{self, Database};
use crate::error::{Result, StarredError};
use crate::github::{fetch_all_starred, CachedGitHubClient, GitHubClient, ACCEPT_HEADER};
use crate::output;

/// What a `starred get` run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
  pub fetched: usize,
  pub saved: Option<SaveSummary>,
  pub json_written: bool,
}

/// Fetch all starred repositories and write them to the requested outputs.
///
/// The database is written before the JSON file. A fetch that returns no
/// repositories at all is reported as `NoRepositories` and nothing is
/// written.
pub async fn run(settings: &Settings, cancel: &CancellationToken) -> Result<RunSummary> {
  let cache = CacheLayer::open(&settings.cache_dir, settings.cache_duration)?;
  let client = CachedGitHubClient::new(GitHubClient::new(&settings.token, ACCEPT_HEADER)?, cache);

  let repos = fetch_all_starred(&client, &settings.fetch, cancel).await?;
  if repos.is_empty() {
    return Err(StarredError::NoRepositories);
  }
  info!("Fetched {} starred repositories", repos.len());

  let mut summary = RunSummary {
    fetched: repos.len(),
    ..RunSummary::default()
  };

  if let Some(path) = &settings.database {
    let mut database = Database::open(path)?;
    let saved = db::save_repositories(&mut database, &repos, cancel)?;
    info!(
      inserted = saved.inserted,
      existing = saved.existing,
      "Repositories saved to database {}",
      path.display()
    );
    summary.saved = Some(saved);
  }

  if let Some(path) = &settings.json_output {
    if cancel.is_cancelled() {
      return Err(StarredError::Cancelled);
    }
    output::write_json(path, &repos)?;
    info!("Starred repositories saved to {}", path.display());
    summary.json_written = true;
  }

  if settings.database.is_none() && settings.json_output.is_none() {
    info!("Nothing saved; pass --save-json and/or --save-db to keep the results");
  }

  Ok(summary)
}
