//! Workflow dispatch.

use std::collections::HashMap;

use tracing::{info, instrument};
use wfdispatch_config::RepoRef;
use wfdispatch_github::DispatchRequest;

use crate::error::DispatchError;
use crate::session::ApiSession;

/// Check that a dispatch has a repository and a workflow to target.
pub fn validate_target(repo: &str, workflow_id: &str) -> Result<RepoRef, DispatchError> {
  if workflow_id.trim().is_empty() {
    return Err(invalid_workflow(repo, workflow_id));
  }
  parse_repo(repo, workflow_id)
}

/// Parse the target repository. A missing or malformed repository is an
/// invalid target in every mode.
pub fn parse_repo(repo: &str, workflow_id: &str) -> Result<RepoRef, DispatchError> {
  repo
    .parse()
    .map_err(|_| invalid_workflow(repo, workflow_id))
}

fn invalid_workflow(repo: &str, workflow_id: &str) -> DispatchError {
  DispatchError::InvalidWorkflow {
    repo: repo.to_string(),
    workflow_id: workflow_id.to_string(),
  }
}

/// Ask GitHub to start a run of `workflow_id` on `git_ref`.
///
/// Not retried: a second dispatch would start a second run.
#[instrument(name = "trigger", skip_all, fields(repo = %repo, workflow_id = %workflow_id, git_ref = %git_ref))]
pub async fn trigger(
  session: &ApiSession<'_>,
  repo: &RepoRef,
  workflow_id: &str,
  git_ref: &str,
  inputs: &HashMap<String, serde_json::Value>,
) -> Result<(), DispatchError> {
  let token = session.token().await?;
  let body = DispatchRequest { git_ref, inputs };

  info!(inputs = inputs.len(), "dispatching workflow");
  session
    .client()
    .dispatch_workflow(repo, workflow_id, &body, &token)
    .await
    .map_err(|source| DispatchError::Trigger { source })?;
  info!("workflow dispatched");

  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_target() {
    let repo = validate_target("o/r", "deploy.yml").unwrap();
    assert_eq!(repo, RepoRef::new("o", "r"));

    for (repo, workflow_id) in [("", "deploy.yml"), ("o/r", ""), ("o/r", "  "), ("o", "d.yml")] {
      let err = validate_target(repo, workflow_id).unwrap_err();
      assert_eq!(err.conclusion(), "invalid_workflow");
    }
  }

  #[test]
  fn test_parse_repo_ignores_workflow() {
    assert_eq!(parse_repo("o/r", "").unwrap(), RepoRef::new("o", "r"));

    for repo in ["", "o", "o/r/x"] {
      let err = parse_repo(repo, "").unwrap_err();
      assert!(matches!(err, DispatchError::InvalidWorkflow { .. }));
    }
  }
}
