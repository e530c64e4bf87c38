//! Cache layer that sits between callers and the network fetchers.

use chrono::Duration;
use color_eyre::Result;
use serde_json::Value;
use std::sync::Arc;

use crate::config::{CacheBackend, CacheConfig};

use super::key::{CacheKey, CallArgs};
use super::storage::{CacheStorage, FileStorage, NoopStorage, SqliteStorage};
use super::traits::{CacheEntry, Clock, SystemClock};

/// Process-wide response cache.
///
/// Storage failures never escape this type: a failed read is a miss and a
/// failed write is logged and reported as `false`.
pub struct CacheStore {
  enabled: bool,
  storage: Box<dyn CacheStorage>,
  clock: Box<dyn Clock>,
}

impl CacheStore {
  /// Open the store described by `config` using the system clock.
  ///
  /// Nothing is created on disk when caching is disabled. A backend that
  /// cannot be opened leaves the store disabled for this run.
  pub fn open(config: &CacheConfig) -> Self {
    if !config.enabled {
      return Self::disabled();
    }

    let storage: Result<Box<dyn CacheStorage>> = match config.backend {
      CacheBackend::File => {
        FileStorage::open(&config.dir).map(|s| Box::new(s) as Box<dyn CacheStorage>)
      }
      CacheBackend::Sqlite => {
        SqliteStorage::open(&config.dir).map(|s| Box::new(s) as Box<dyn CacheStorage>)
      }
    };

    match storage {
      Ok(storage) => Self {
        enabled: true,
        storage,
        clock: Box::new(SystemClock),
      },
      Err(e) => {
        tracing::warn!(
          dir = %config.dir.display(),
          error = %e,
          "cache unavailable, continuing without it"
        );
        Self::disabled()
      }
    }
  }

  /// An enabled store over an explicit backend and clock.
  #[cfg(test)]
  pub fn new(storage: impl CacheStorage + 'static, clock: impl Clock + 'static) -> Self {
    Self {
      enabled: true,
      storage: Box::new(storage),
      clock: Box::new(clock),
    }
  }

  /// A store that always misses and never writes.
  pub fn disabled() -> Self {
    Self {
      enabled: false,
      storage: Box::new(NoopStorage),
      clock: Box::new(SystemClock),
    }
  }

  /// Look up `key`, returning the payload only if it is at most `max_age` old.
  pub fn get(&self, key: &CacheKey, max_age: Duration) -> Option<Value> {
    if !self.enabled {
      return None;
    }

    match self.storage.read(key) {
      Ok(Some(entry)) if entry.is_fresh(self.clock.now(), max_age) => Some(entry.value),
      Ok(Some(_)) => {
        tracing::debug!(%key, "cache entry expired");
        None
      }
      Ok(None) => None,
      Err(e) => {
        tracing::warn!(%key, error = %e, "failed to read cache entry");
        None
      }
    }
  }

  /// Store `value` under `key`, stamped with the current time.
  pub fn set(&self, key: &CacheKey, value: &Value) -> bool {
    if !self.enabled {
      return false;
    }

    let entry = CacheEntry {
      key: key.as_str().to_string(),
      value: value.clone(),
      stored_at: self.clock.now(),
    };

    match self.storage.write(key, &entry) {
      Ok(()) => true,
      Err(e) => {
        tracing::warn!(%key, error = %e, "failed to write cache entry");
        false
      }
    }
  }
}

/// A named fetch operation whose results are cached for a fixed `max_age`.
///
/// The name and freshness window are fixed when the operation is created;
/// callers only supply the arguments and the fetch to run on a miss.
#[derive(Clone)]
pub struct CachedOperation {
  name: &'static str,
  max_age: Duration,
  store: Arc<CacheStore>,
}

impl CachedOperation {
  pub fn new(name: &'static str, max_age: Duration, store: Arc<CacheStore>) -> Self {
    Self {
      name,
      max_age,
      store,
    }
  }

  /// Return the cached payload for `args` or run `fetcher` and cache its result.
  ///
  /// 1. Fresh entry under the derived key - return it without fetching
  /// 2. Miss or stale - run the fetcher
  /// 3. Fetcher succeeded - store the payload, replacing any stale entry
  /// 4. Fetcher failed - store nothing and return the error unchanged
  pub fn call<E, F>(&self, args: &CallArgs, fetcher: F) -> std::result::Result<Value, E>
  where
    F: FnOnce() -> std::result::Result<Value, E>,
  {
    let key = CacheKey::derive(self.name, args);

    if let Some(value) = self.store.get(&key, self.max_age) {
      tracing::debug!(operation = self.name, %key, "cache hit");
      return Ok(value);
    }

    tracing::debug!(operation = self.name, %key, "cache miss");
    let value = fetcher()?;
    self.store.set(&key, &value);
    Ok(value)
  }
}
