//! Dispatch errors.

use std::time::Duration;

use wfdispatch_auth::AuthError;
use wfdispatch_config::{ConfigError, RunId};
use wfdispatch_github::ApiError;

/// Errors that can occur while dispatching or waiting for a workflow run.
///
/// Every variant maps to the `run_conclusion` reported for the invocation,
/// see [`DispatchError::conclusion`].
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
  /// Configuration could not be parsed or is incomplete.
  #[error(transparent)]
  Config(#[from] ConfigError),

  /// A required input is missing for the requested mode.
  #[error("invalid input: {message}")]
  Input { message: String },

  /// Repository or workflow id is missing or malformed.
  #[error("invalid workflow id or repository: {workflow_id:?} / {repo:?}")]
  InvalidWorkflow { repo: String, workflow_id: String },

  /// The GitHub client could not be built.
  #[error("failed to create github client: {0}")]
  Client(#[source] ApiError),

  /// A bearer token could not be resolved.
  #[error(transparent)]
  Credentials(#[from] AuthError),

  /// The dispatch request was not accepted.
  #[error("failed to trigger workflow: {source}")]
  Trigger {
    #[source]
    source: ApiError,
  },

  /// The run created by the dispatch could not be identified.
  #[error("failed to determine workflow run id: {message}")]
  DetermineRunId {
    message: String,
    #[source]
    source: Option<ApiError>,
  },

  /// The run finished unsuccessfully, or its status could not be read.
  #[error("workflow run {run_id} failed with conclusion {conclusion}")]
  WaitForWorkflow {
    run_id: RunId,
    conclusion: String,
    #[source]
    source: Option<ApiError>,
  },

  /// The run did not complete before the deadline.
  #[error("timed out after {timeout:?} waiting for workflow run {run_id} to complete")]
  Timeout { run_id: RunId, timeout: Duration },

  /// The invocation was cancelled.
  #[error("dispatch cancelled")]
  Cancelled,
}

impl DispatchError {
  /// Run conclusion reported for this failure.
  pub fn conclusion(&self) -> &str {
    match self {
      Self::Config(_) | Self::Input { .. } => "invalid_input",
      Self::InvalidWorkflow { .. } => "invalid_workflow",
      Self::Client(_) => "unknown",
      Self::Credentials(err) => err.conclusion(),
      Self::Trigger { .. } => "trigger_failed",
      Self::DetermineRunId { .. } => "determine_run_id_failed",
      Self::WaitForWorkflow { conclusion, .. } => conclusion,
      Self::Timeout { .. } => "timeout",
      Self::Cancelled => "cancelled",
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_conclusions() {
    let input = DispatchError::Input {
      message: "run_id is required".to_string(),
    };
    assert_eq!(input.conclusion(), "invalid_input");

    let config = DispatchError::from(ConfigError::MissingCredentials);
    assert_eq!(config.conclusion(), "invalid_input");

    let wait = DispatchError::WaitForWorkflow {
      run_id: RunId(1),
      conclusion: "cancelled".to_string(),
      source: None,
    };
    assert_eq!(wait.conclusion(), "cancelled");

    let timeout = DispatchError::Timeout {
      run_id: RunId(1),
      timeout: Duration::from_secs(1),
    };
    assert_eq!(timeout.conclusion(), "timeout");

    let auth = DispatchError::from(AuthError::InvalidCredentials {
      message: "no owner".to_string(),
    });
    assert_eq!(auth.conclusion(), "invalid_input");
  }
}
