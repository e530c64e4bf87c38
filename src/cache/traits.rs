//! Core types for the caching system.

use chrono::{DateTime, Duration, Utc};
use serde_json::Value;

/// A stored response payload together with its write time.
///
/// Entries are never mutated: writing under an existing key replaces the
/// whole entry.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
  /// Logical cache key the entry was written under
  pub key: String,
  /// The response payload exactly as the upstream returned it
  pub value: Value,
  /// When the entry was written
  pub stored_at: DateTime<Utc>,
}

impl CacheEntry {
  /// Whether the entry may be served to a reader that tolerates `max_age`.
  ///
  /// The boundary is inclusive: an entry exactly `max_age` old is still fresh.
  pub fn is_fresh(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
    now - self.stored_at <= max_age
  }
}

/// Source of wall-clock time for cache writes and freshness checks.
pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> {
    Utc::now()
  }
}
