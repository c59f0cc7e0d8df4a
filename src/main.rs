mod app;
mod cache;
mod config;
mod db;
mod error;
mod github;
mod output;

use clap::{Args, Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, Overrides, Settings};
use crate::github::LinkPolicy;

#[derive(Parser, Debug)]
#[command(name = "mygithub")]
#[command(about = "Interact with your GitHub account via the GitHub API and a personal access token")]
#[command(version)]
struct Cli {
  /// Path to config file (default: ./mygithub.yaml or $XDG_CONFIG_HOME/mygithub/config.yaml)
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Log at debug level unless RUST_LOG says otherwise
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Operations on starred repositories
  #[command(subcommand)]
  Starred(StarredCommand),
}

#[derive(Subcommand, Debug)]
enum StarredCommand {
  /// Get starred repositories
  Get(GetArgs),
}

#[derive(Args, Debug)]
struct GetArgs {
  /// GitHub personal access token (falls back to GITHUB_TOKEN, then the config file)
  #[arg(short = 't', long)]
  access_token: Option<String>,

  /// Save response content to a JSON file
  #[arg(short, long)]
  save_json: bool,

  /// Output file name
  #[arg(short, long)]
  output: Option<PathBuf>,

  /// Save response content to a SQLite database
  #[arg(long)]
  save_db: bool,

  /// SQLite database path
  #[arg(long)]
  database: Option<PathBuf>,

  /// Time between requests (seconds)
  #[arg(long)]
  request_sleep: Option<u64>,

  /// Directory for HTTP cache storage
  #[arg(long)]
  cache_dir: Option<PathBuf>,

  /// HTTP cache duration in minutes (0 to disable)
  #[arg(long)]
  cache_duration: Option<u64>,

  /// How to treat an unparseable Link header
  #[arg(long, value_enum)]
  link_policy: Option<LinkPolicy>,
}

impl From<GetArgs> for Overrides {
  fn from(args: GetArgs) -> Self {
    Self {
      access_token: args.access_token,
      cache_dir: args.cache_dir,
      cache_duration: args.cache_duration,
      request_sleep: args.request_sleep,
      link_policy: args.link_policy,
      save_json: args.save_json,
      output_file: args.output,
      save_db: args.save_db,
      database: args.database,
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let cli = Cli::parse();

  // Logs go to stderr so stdout stays clean
  let (writer, _guard) = tracing_appender::non_blocking(std::io::stderr());
  let default_level = if cli.verbose {
    "mygithub=debug"
  } else {
    "mygithub=info"
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_writer(writer)
    .init();

  let config = Config::load(cli.config.as_deref())?;

  match cli.command {
    Command::Starred(StarredCommand::Get(args)) => {
      let env_token = std::env::var("GITHUB_TOKEN").ok();
      let settings = Settings::resolve(config, args.into(), env_token.as_deref())?;

      let cancel = CancellationToken::new();
      let on_interrupt = cancel.clone();
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          warn!("Interrupted, stopping");
          on_interrupt.cancel();
        }
      });

      let summary = app::run(&settings, &cancel).await?;
      println!("Fetched {} starred repositories.", summary.fetched);
      if let Some(path) = summary.saved.and(settings.database.as_ref()) {
        println!("Repositories saved to database: {}", path.display());
      }
      if let Some(path) = settings.json_output.as_ref().filter(|_| summary.json_written) {
        println!("Starred repositories saved to: {}", path.display());
      }
    }
  }

  Ok(())
}
