use color_eyre::{eyre::eyre, Result};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::ApiConfig;

use super::error::FetchError;

/// The upstream rejects requests without a browser-like agent.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
  AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// An idempotent GET of an API path returning its JSON body.
pub trait Fetcher {
  fn get(&self, path: &str) -> Result<Value, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for &F {
  fn get(&self, path: &str) -> Result<Value, FetchError> {
    (**self).get(path)
  }
}

/// SofaScore API client wrapper performing one HTTP request per call.
#[derive(Clone)]
pub struct HttpFetcher {
  client: Client,
  base: String,
}

impl HttpFetcher {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(config.timeout())
      .user_agent(USER_AGENT)
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      client,
      base: config.base.trim_end_matches('/').to_string(),
    })
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base, path)
  }
}

impl Fetcher for HttpFetcher {
  fn get(&self, path: &str) -> Result<Value, FetchError> {
    let url = self.url(path);
    tracing::debug!(%url, "GET");

    let response = self
      .client
      .get(&url)
      .send()
      .map_err(|e| {
        if e.is_builder() {
          FetchError::Invalid {
            url: url.clone(),
            reason: e.to_string(),
          }
        } else {
          FetchError::Transient {
            url: url.clone(),
            reason: e.to_string(),
          }
        }
      })?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Rejected {
        url,
        status: status.as_u16(),
      });
    }

    let body = response.bytes().map_err(|e| FetchError::Transient {
      url: url.clone(),
      reason: e.to_string(),
    })?;

    serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
      context: format!("response from {}", url),
      source,
    })
  }
}
