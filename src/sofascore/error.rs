use thiserror::Error;

/// Why a fetch against the upstream API failed.
#[derive(Debug, Error)]
pub enum FetchError {
  /// The request never completed: connection refused, timeout, DNS, dropped body.
  #[error("network error requesting {url}: {reason}")]
  Transient { url: String, reason: String },

  /// The request could not be built, so it was never sent.
  #[error("invalid request {url}: {reason}")]
  Invalid { url: String, reason: String },

  /// The upstream answered with a non-success status.
  #[error("{url} responded with HTTP {status}")]
  Rejected { url: String, status: u16 },

  /// The upstream answered successfully but the body was not what we expected.
  #[error("failed to decode {context}: {source}")]
  Decode {
    context: String,
    #[source]
    source: serde_json::Error,
  },
}

impl FetchError {
  /// Only transient failures are worth another attempt.
  pub fn is_transient(&self) -> bool {
    matches!(self, Self::Transient { .. })
  }

  /// HTTP status of a rejected request.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::Rejected { status, .. } => Some(*status),
      _ => None,
    }
  }
}
