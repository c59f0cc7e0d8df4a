// GitHub API module.
// Provides the authenticated client, its cached wrapper, response types, and
// the starred-repositories pagination loop.

pub mod cached_client;
pub mod client;
pub mod starred;
pub mod types;

pub use cached_client::CachedGitHubClient;
pub use client::GitHubClient;
pub use starred::{fetch_all_starred, FetchOptions, LinkPolicy, ACCEPT_HEADER, STARRED_URL};
pub use types::Repository;
