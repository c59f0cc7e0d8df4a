//! Serde types matching the GitHub "list starred repositories" response.
//!
//! Fields the persistence layer needs are modelled explicitly; everything
//! else the API returns is kept in `extra` so a JSON export reproduces the
//! original payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Repository {
  pub id: i64,
  pub node_id: String,
  pub name: String,
  pub full_name: String,
  pub private: bool,
  pub owner: Owner,
  pub html_url: String,
  pub description: Option<String>,
  pub fork: bool,
  pub url: String,
  pub created_at: Option<DateTime<Utc>>,
  pub updated_at: Option<DateTime<Utc>>,
  pub pushed_at: Option<DateTime<Utc>>,
  pub git_url: String,
  pub ssh_url: String,
  pub clone_url: String,
  pub svn_url: String,
  pub homepage: Option<String>,
  pub size: i64,
  pub stargazers_count: i64,
  pub watchers_count: i64,
  pub language: Option<String>,
  pub has_issues: bool,
  pub has_projects: bool,
  pub has_downloads: bool,
  pub has_wiki: bool,
  pub has_pages: bool,
  pub has_discussions: bool,
  pub forks_count: i64,
  pub mirror_url: Option<String>,
  pub archived: bool,
  pub disabled: bool,
  pub open_issues_count: i64,
  pub license: Option<License>,
  pub allow_forking: bool,
  pub is_template: bool,
  pub web_commit_signoff_required: bool,
  pub topics: Vec<String>,
  pub visibility: String,
  pub forks: i64,
  pub open_issues: i64,
  pub watchers: i64,
  pub default_branch: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub permissions: Option<Permissions>,
  // Catch-all for the *_url templates and anything newer
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Owner {
  pub id: i64,
  pub login: String,
  pub node_id: String,
  pub avatar_url: String,
  pub gravatar_id: String,
  pub url: String,
  pub html_url: String,
  pub followers_url: String,
  pub following_url: String,
  pub gists_url: String,
  pub starred_url: String,
  pub subscriptions_url: String,
  pub organizations_url: String,
  pub repos_url: String,
  pub events_url: String,
  pub received_events_url: String,
  #[serde(rename = "type")]
  pub owner_type: String,
  pub user_view_type: Option<String>,
  pub site_admin: bool,
}

/// Every field is nullable in the API (e.g. `spdx_id` for "Other").
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct License {
  pub key: Option<String>,
  pub name: Option<String>,
  pub spdx_id: Option<String>,
  pub url: Option<String>,
  pub node_id: Option<String>,
}

/// The authenticated user's access to a repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Permissions {
  pub admin: Option<bool>,
  pub maintain: Option<bool>,
  pub push: Option<bool>,
  pub triage: Option<bool>,
  pub pull: Option<bool>,
}
