use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wfdispatch_config::RunId;

/// Run status once no further transitions happen.
pub const STATUS_COMPLETED: &str = "completed";

/// Body of a workflow dispatch request.
#[derive(Debug, Serialize)]
pub struct DispatchRequest<'a> {
  #[serde(rename = "ref")]
  pub git_ref: &'a str,
  pub inputs: &'a HashMap<String, serde_json::Value>,
}

/// A workflow run as reported by the runs endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WorkflowRun {
  pub id: RunId,
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub head_branch: Option<String>,
  /// Numeric id of the workflow the run belongs to.
  #[serde(default)]
  pub workflow_id: Option<u64>,
  /// Workflow file path, e.g. `.github/workflows/deploy.yml`.
  #[serde(default)]
  pub path: String,
  #[serde(default)]
  pub status: Option<String>,
  #[serde(default)]
  pub conclusion: Option<String>,
  #[serde(default)]
  pub html_url: Option<String>,
}

impl WorkflowRun {
  pub fn is_completed(&self) -> bool {
    self.status.as_deref() == Some(STATUS_COMPLETED)
  }
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunList {
  #[serde(default)]
  pub workflow_runs: Vec<WorkflowRun>,
}

/// A GitHub App installation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Installation {
  pub id: u64,
}

/// Installation access token returned by the token exchange.
#[derive(Debug, Clone)]
pub struct InstallationToken {
  pub token: String,
  pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawInstallationToken {
  #[serde(default)]
  pub token: Option<String>,
  #[serde(default)]
  pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_run_tolerates_nulls_and_extra_fields() {
    let run: WorkflowRun = serde_json::from_value(serde_json::json!({
      "id": 30433642,
      "name": "Build",
      "head_branch": null,
      "workflow_id": 161335,
      "path": ".github/workflows/build.yml",
      "status": "queued",
      "conclusion": null,
      "run_attempt": 1,
      "event": "workflow_dispatch"
    }))
    .unwrap();

    assert_eq!(run.id, RunId(30433642));
    assert_eq!(run.head_branch, None);
    assert_eq!(run.workflow_id, Some(161335));
    assert!(!run.is_completed());
  }

  #[test]
  fn test_dispatch_request_uses_ref_key() {
    let inputs = HashMap::from([("key".to_string(), serde_json::json!("value"))]);
    let body = serde_json::to_value(DispatchRequest {
      git_ref: "main",
      inputs: &inputs,
    })
    .unwrap();

    assert_eq!(
      body,
      serde_json::json!({"ref": "main", "inputs": {"key": "value"}})
    );
  }
}
