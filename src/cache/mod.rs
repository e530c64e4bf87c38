//! Local response cache.
//!
//! This module provides an API-agnostic caching mechanism that:
//! - Derives deterministic keys from an operation name and its arguments
//! - Persists whole payloads per key (one file per key, or SQLite)
//! - Decides freshness per read from the entry's write time and a `max_age`
//! - Absorbs storage failures so a broken cache only costs a refetch

mod key;
mod layer;
mod storage;
mod traits;

pub use key::CallArgs;
pub use layer::{CacheStore, CachedOperation};
#[cfg(test)]
pub use storage::FileStorage;
#[cfg(test)]
pub use traits::test_clock::ManualClock;
