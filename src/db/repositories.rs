//! Mapping fetched repositories onto the relational schema.
//!
//! Every insert is insert-if-absent: rows that already exist are never
//! updated, so re-running an export does not refresh star counts or other
//! fields of repositories seen before.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Transaction};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Database;
use crate::error::{Result, StarredError};
use crate::github::types::{License, Owner, Permissions, Repository};

/// Outcome of a save run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
  /// Repositories written by this run
  pub inserted: usize,
  /// Repositories that were already stored and left untouched
  pub existing: usize,
}

/// Log progress every this many records.
const PROGRESS_INTERVAL: usize = 100;

/// Save repositories in input order.
///
/// Each repository is written in its own transaction together with its
/// owner, license and permissions rows. The first failure aborts the run;
/// repositories saved before it stay saved. `cancel` is checked before each
/// record.
pub fn save_repositories(
  db: &mut Database,
  repos: &[Repository],
  cancel: &CancellationToken,
) -> Result<SaveSummary> {
  let mut summary = SaveSummary::default();
  let total = repos.len();

  for (i, repo) in repos.iter().enumerate() {
    let position = i + 1;
    let repo_id = repo.id;
    if cancel.is_cancelled() {
      warn!("Save cancelled after {}/{} repositories", i, total);
      return Err(StarredError::Cancelled);
    }
    let fail = move |stage: &'static str| {
      move |source: rusqlite::Error| StarredError::Persistence {
        position,
        repo_id,
        stage,
        source,
      }
    };

    let tx = db.conn_mut().transaction().map_err(fail("transaction"))?;

    insert_owner(&tx, &repo.owner).map_err(fail("owner"))?;
    let license_id = repo
      .license
      .as_ref()
      .map(|license| upsert_license(&tx, license))
      .transpose()
      .map_err(fail("license"))?;
    let permissions_id = repo
      .permissions
      .as_ref()
      .map(|permissions| upsert_permissions(&tx, permissions))
      .transpose()
      .map_err(fail("permissions"))?;
    let inserted =
      insert_repository(&tx, repo, license_id, permissions_id).map_err(fail("repository"))?;

    tx.commit().map_err(fail("commit"))?;

    if inserted {
      summary.inserted += 1;
    } else {
      summary.existing += 1;
    }

    if position % PROGRESS_INTERVAL == 0 || position == total {
      info!("Saved {}/{} repositories to database", position, total);
    }
  }

  Ok(summary)
}

fn insert_owner(tx: &Transaction, owner: &Owner) -> rusqlite::Result<()> {
  tx.execute(
    "INSERT OR IGNORE INTO owners (
       id, login, node_id, avatar_url, gravatar_id, url, html_url, followers_url,
       following_url, gists_url, starred_url, subscriptions_url, organizations_url,
       repos_url, events_url, received_events_url, type, user_view_type, site_admin
     ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    params![
      owner.id,
      owner.login,
      owner.node_id,
      owner.avatar_url,
      owner.gravatar_id,
      owner.url,
      owner.html_url,
      owner.followers_url,
      owner.following_url,
      owner.gists_url,
      owner.starred_url,
      owner.subscriptions_url,
      owner.organizations_url,
      owner.repos_url,
      owner.events_url,
      owner.received_events_url,
      owner.owner_type,
      owner.user_view_type,
      owner.site_admin,
    ],
  )?;
  Ok(())
}

/// Find a license row with exactly these values, or insert one.
fn upsert_license(tx: &Transaction, license: &License) -> rusqlite::Result<i64> {
  let values = params![
    license.key,
    license.name,
    license.spdx_id,
    license.url,
    license.node_id,
  ];

  let existing: Option<i64> = tx
    .query_row(
      "SELECT id FROM licenses
       WHERE key IS ? AND name IS ? AND spdx_id IS ? AND url IS ? AND node_id IS ?",
      values,
      |row| row.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  tx.execute(
    "INSERT INTO licenses (key, name, spdx_id, url, node_id) VALUES (?, ?, ?, ?, ?)",
    values,
  )?;
  Ok(tx.last_insert_rowid())
}

/// Find a permissions row with exactly these flags, or insert one.
fn upsert_permissions(tx: &Transaction, permissions: &Permissions) -> rusqlite::Result<i64> {
  let values = params![
    permissions.admin,
    permissions.maintain,
    permissions.push,
    permissions.triage,
    permissions.pull,
  ];

  let existing: Option<i64> = tx
    .query_row(
      "SELECT id FROM permissions
       WHERE admin IS ? AND maintain IS ? AND push IS ? AND triage IS ? AND pull IS ?",
      values,
      |row| row.get(0),
    )
    .optional()?;
  if let Some(id) = existing {
    return Ok(id);
  }

  tx.execute(
    "INSERT INTO permissions (admin, maintain, push, triage, pull) VALUES (?, ?, ?, ?, ?)",
    values,
  )?;
  Ok(tx.last_insert_rowid())
}

/// Returns false when a row with this id already existed.
fn insert_repository(
  tx: &Transaction,
  repo: &Repository,
  license_id: Option<i64>,
  permissions_id: Option<i64>,
) -> rusqlite::Result<bool> {
  let topics = serde_json::to_string(&repo.topics)
    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;

  let changed = tx.execute(
    "INSERT OR IGNORE INTO repositories (
       id, node_id, name, full_name, private, owner_id, html_url, description, fork, url,
       created_at, updated_at, pushed_at, git_url, ssh_url, clone_url, svn_url, homepage,
       size, stargazers_count, watchers_count, language, has_issues, has_projects,
       has_downloads, has_wiki, has_pages, has_discussions, forks_count, mirror_url,
       archived, disabled, open_issues_count, license_id, allow_forking, is_template,
       web_commit_signoff_required, topics, visibility, forks, open_issues, watchers,
       default_branch, permissions_id
     ) VALUES (
       ?, ?, ?, ?, ?, ?, ?, ?, ?, ?,
       ?, ?, ?, ?, ?, ?, ?, ?,
       ?, ?, ?, ?, ?, ?,
       ?, ?, ?, ?, ?, ?,
       ?, ?, ?, ?, ?, ?,
       ?, ?, ?, ?, ?, ?,
       ?, ?
     )",
    params![
      repo.id,
      repo.node_id,
      repo.name,
      repo.full_name,
      repo.private,
      repo.owner.id,
      repo.html_url,
      repo.description,
      repo.fork,
      repo.url,
      timestamp(repo.created_at),
      timestamp(repo.updated_at),
      timestamp(repo.pushed_at),
      repo.git_url,
      repo.ssh_url,
      repo.clone_url,
      repo.svn_url,
      repo.homepage,
      repo.size,
      repo.stargazers_count,
      repo.watchers_count,
      repo.language,
      repo.has_issues,
      repo.has_projects,
      repo.has_downloads,
      repo.has_wiki,
      repo.has_pages,
      repo.has_discussions,
      repo.forks_count,
      repo.mirror_url,
      repo.archived,
      repo.disabled,
      repo.open_issues_count,
      license_id,
      repo.allow_forking,
      repo.is_template,
      repo.web_commit_signoff_required,
      topics,
      repo.visibility,
      repo.forks,
      repo.open_issues,
      repo.watchers,
      repo.default_branch,
      permissions_id,
    ],
  )?;

  Ok(changed > 0)
}

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
  value.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
}
