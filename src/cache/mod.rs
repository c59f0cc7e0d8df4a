//! Persistent HTTP response cache with a time-to-live policy.
//!
//! Responses are keyed by a hash of the request method and URL and stored in
//! a SQLite file inside the cache directory. A lookup that finds an entry
//! older than the TTL evicts it on the spot. A TTL of zero disables the
//! cache entirely.

mod layer;
mod storage;
mod traits;

pub use layer::CacheLayer;
pub use traits::{CacheSource, CachedResponse, RequestKey};
