//! Bounded retry of transient fetch failures.

use serde_json::Value;
use std::thread;
use std::time::Duration;

use crate::config::ApiConfig;

use super::client::Fetcher;
use super::error::FetchError;

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts including the first; at least 1
  pub max_attempts: u32,
  /// Fixed wait between attempts
  pub delay: Duration,
}

impl RetryPolicy {
  pub fn new(max_attempts: u32, delay: Duration) -> Self {
    Self {
      max_attempts: max_attempts.max(1),
      delay,
    }
  }

  pub fn from_config(config: &ApiConfig) -> Self {
    Self::new(config.retries, config.retry_delay())
  }
}

/// Classification of a single attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
  Success,
  TransientFailure,
  PermanentFailure,
}

impl AttemptOutcome {
  fn of(result: &Result<Value, FetchError>) -> Self {
    match result {
      Ok(_) => Self::Success,
      Err(e) if e.is_transient() => Self::TransientFailure,
      Err(_) => Self::PermanentFailure,
    }
  }
}

/// Fetcher that retries transient failures of the wrapped fetcher.
///
/// Rejections and decode failures are returned from the attempt that
/// produced them. When every attempt fails transiently the last failure is
/// returned.
#[derive(Clone)]
pub struct Retrying<F> {
  inner: F,
  policy: RetryPolicy,
}

impl<F: Fetcher> Retrying<F> {
  pub fn new(inner: F, policy: RetryPolicy) -> Self {
    Self { inner, policy }
  }
}

impl<F: Fetcher> Fetcher for Retrying<F> {
  fn get(&self, path: &str) -> Result<Value, FetchError> {
    let mut attempt = 1;
    loop {
      let result = self.inner.get(path);
      let outcome = AttemptOutcome::of(&result);

      match outcome {
        AttemptOutcome::TransientFailure if attempt < self.policy.max_attempts => {
          if let Err(e) = &result {
            tracing::warn!(
              path,
              attempt,
              max_attempts = self.policy.max_attempts,
              error = %e,
              "transient failure, retrying"
            );
          }
          thread::sleep(self.policy.delay);
          attempt += 1;
        }
        _ => {
          tracing::debug!(path, attempt, ?outcome, "fetch finished");
          return result;
        }
      }
    }
  }
}
