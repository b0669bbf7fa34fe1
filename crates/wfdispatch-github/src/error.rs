use thiserror::Error;

/// Errors returned by [`crate::GithubClient`].
#[derive(Debug, Error)]
pub enum ApiError {
  /// The HTTP client could not be constructed.
  #[error("failed to build http client: {0}")]
  Client(#[source] reqwest::Error),

  /// The request never produced a response (connect, timeout, TLS, ...).
  #[error("{operation} request failed: {source}")]
  Transport {
    operation: &'static str,
    #[source]
    source: reqwest::Error,
  },

  /// The server answered with a status other than the one the endpoint promises.
  #[error("{operation} returned unexpected status {status}: {body}")]
  UnexpectedStatus {
    operation: &'static str,
    status: u16,
    body: String,
  },

  /// The response body did not have the expected shape.
  #[error("failed to decode {operation} response: {message}")]
  Decode {
    operation: &'static str,
    message: String,
  },
}

impl ApiError {
  /// HTTP status of the response, when there was one.
  pub fn status(&self) -> Option<u16> {
    match self {
      Self::UnexpectedStatus { status, .. } => Some(*status),
      Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
      _ => None,
    }
  }
}
