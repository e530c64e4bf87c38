//! Scripted fetcher for tests.

use serde_json::Value;
use std::cell::RefCell;
use std::collections::VecDeque;

use super::client::Fetcher;
use super::error::FetchError;

type Respond = Box<dyn Fn() -> Result<Value, FetchError>>;

/// Fetcher that replays scripted results and records every requested path.
pub struct MockFetcher {
  script: RefCell<VecDeque<Result<Value, FetchError>>>,
  fallback: Option<Respond>,
  paths: RefCell<Vec<String>>,
}

impl MockFetcher {
  /// Answer every call with `respond()`.
  pub fn always(respond: impl Fn() -> Result<Value, FetchError> + 'static) -> Self {
    Self {
      script: RefCell::new(VecDeque::new()),
      fallback: Some(Box::new(respond)),
      paths: RefCell::new(Vec::new()),
    }
  }

  /// Answer calls with `results` in order; running out is a test bug.
  pub fn scripted(results: Vec<Result<Value, FetchError>>) -> Self {
    Self {
      script: RefCell::new(results.into()),
      fallback: None,
      paths: RefCell::new(Vec::new()),
    }
  }

  pub fn transient() -> Result<Value, FetchError> {
    Err(FetchError::Transient {
      url: "http://upstream.test".to_string(),
      reason: "connection refused".to_string(),
    })
  }

  pub fn rejected(status: u16) -> Result<Value, FetchError> {
    Err(FetchError::Rejected {
      url: "http://upstream.test".to_string(),
      status,
    })
  }

  pub fn calls(&self) -> usize {
    self.paths.borrow().len()
  }

  pub fn paths(&self) -> Vec<String> {
    self.paths.borrow().clone()
  }
}

impl Fetcher for MockFetcher {
  fn get(&self, path: &str) -> Result<Value, FetchError> {
    self.paths.borrow_mut().push(path.to_string());

    if let Some(result) = self.script.borrow_mut().pop_front() {
      return result;
    }
    match &self.fallback {
      Some(respond) => respond(),
      None => panic!("unexpected fetch of {}", path),
    }
  }
}
