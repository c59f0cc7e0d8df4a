use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Result, StarredError};
use crate::github::{FetchOptions, LinkPolicy, STARRED_URL};

pub const DEFAULT_CACHE_DIR: &str = ".httpcache";
pub const DEFAULT_CACHE_DURATION: u64 = 5;
pub const DEFAULT_OUTPUT_FILE: &str = "starred_repos.json";
pub const DEFAULT_DATABASE: &str = "mygithub.db";

/// Optional settings file. Every key can be overridden on the command line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub access_token: Option<String>,
  pub cache_dir: Option<PathBuf>,
  /// Minutes; 0 disables the HTTP cache
  pub cache_duration: Option<u64>,
  /// Seconds to wait between pages
  pub request_sleep: Option<u64>,
  pub database: Option<PathBuf>,
  pub output_file: Option<PathBuf>,
  pub link_policy: Option<LinkPolicy>,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./mygithub.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/mygithub/config.yaml
  ///
  /// Having no config file at all is fine; an explicit path that doesn't
  /// exist is not.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(StarredError::Config(format!(
          "Config file not found: {}",
          p.display()
        )));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("mygithub.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("mygithub").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
      StarredError::Config(format!(
        "Failed to read config file {}: {}",
        path.display(),
        e
      ))
    })?;

    serde_yaml::from_str(&contents).map_err(|e| {
      StarredError::Config(format!(
        "Failed to parse config file {}: {}",
        path.display(),
        e
      ))
    })
  }
}

/// Pick the access token: flag, then environment, then config file.
/// Blank values are skipped.
pub fn resolve_token(
  flag: Option<&str>,
  env: Option<&str>,
  file: Option<&str>,
) -> Result<String> {
  [flag, env, file]
    .into_iter()
    .flatten()
    .map(str::trim)
    .find(|t| !t.is_empty())
    .map(String::from)
    .ok_or_else(|| {
      StarredError::Config(
        "GitHub access token not provided (use --access-token, GITHUB_TOKEN env, or config file)"
          .to_string(),
      )
    })
}

/// Fully resolved options for one `starred get` run.
#[derive(Debug, Clone)]
pub struct Settings {
  pub token: String,
  pub cache_dir: PathBuf,
  pub cache_duration: u64,
  pub fetch: FetchOptions,
  /// Where to write the JSON snapshot, if requested
  pub json_output: Option<PathBuf>,
  /// Where to store the SQLite database, if requested
  pub database: Option<PathBuf>,
}

/// Command-line values layered over the config file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
  pub access_token: Option<String>,
  pub cache_dir: Option<PathBuf>,
  pub cache_duration: Option<u64>,
  pub request_sleep: Option<u64>,
  pub link_policy: Option<LinkPolicy>,
  pub save_json: bool,
  pub output_file: Option<PathBuf>,
  pub save_db: bool,
  pub database: Option<PathBuf>,
}

impl Settings {
  pub fn resolve(config: Config, overrides: Overrides, env_token: Option<&str>) -> Result<Self> {
    let token = resolve_token(
      overrides.access_token.as_deref(),
      env_token,
      config.access_token.as_deref(),
    )?;

    let json_output = if overrides.save_json {
      let path = overrides
        .output_file
        .or(config.output_file)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE));
      if path.as_os_str().is_empty() {
        return Err(StarredError::Config(
          "Output file path must be specified with --output when using --save-json".to_string(),
        ));
      }
      Some(path)
    } else {
      None
    };

    let database = overrides.save_db.then(|| {
      overrides
        .database
        .or(config.database)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_DATABASE))
    });

    Ok(Self {
      token,
      cache_dir: overrides
        .cache_dir
        .or(config.cache_dir)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CACHE_DIR)),
      cache_duration: overrides
        .cache_duration
        .or(config.cache_duration)
        .unwrap_or(DEFAULT_CACHE_DURATION),
      fetch: FetchOptions {
        initial_url: STARRED_URL.to_string(),
        request_delay: Duration::from_secs(
          overrides.request_sleep.or(config.request_sleep).unwrap_or(0),
        ),
        link_policy: overrides
          .link_policy
          .or(config.link_policy)
          .unwrap_or_default(),
      },
      json_output,
      database,
    })
  }
}
