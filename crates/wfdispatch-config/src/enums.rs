use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a single invocation does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionMode {
  #[default]
  TriggerAndWait,
  TriggerOnly,
  WaitOnly,
}

impl ActionMode {
  /// Whether this mode dispatches a new run.
  pub fn triggers(self) -> bool {
    matches!(self, Self::TriggerAndWait | Self::TriggerOnly)
  }

  /// Whether this mode waits for a run to finish.
  pub fn waits(self) -> bool {
    matches!(self, Self::TriggerAndWait | Self::WaitOnly)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::TriggerAndWait => "trigger-and-wait",
      Self::TriggerOnly => "trigger-only",
      Self::WaitOnly => "wait-only",
    }
  }
}

impl fmt::Display for ActionMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for ActionMode {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim() {
      "trigger-and-wait" => Ok(Self::TriggerAndWait),
      "trigger-only" => Ok(Self::TriggerOnly),
      "wait-only" => Ok(Self::WaitOnly),
      other => Err(ConfigError::InvalidAction {
        value: other.to_string(),
      }),
    }
  }
}

/// What to do with a failed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
  /// Return the error to the caller.
  #[default]
  Propagate,
  /// Record the failure as the run conclusion and report success.
  Suppress,
}

impl FailurePolicy {
  pub fn from_no_throw(no_throw: bool) -> Self {
    if no_throw {
      Self::Suppress
    } else {
      Self::Propagate
    }
  }
}

/// Which runs listing endpoint the run locator polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunListScope {
  /// `/repos/{owner}/{repo}/actions/workflows/{workflow_id}/runs`
  #[default]
  Workflow,
  /// `/repos/{owner}/{repo}/actions/runs`
  Repository,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_action_mode_phases() {
    assert!(ActionMode::TriggerAndWait.triggers());
    assert!(ActionMode::TriggerAndWait.waits());
    assert!(ActionMode::TriggerOnly.triggers());
    assert!(!ActionMode::TriggerOnly.waits());
    assert!(!ActionMode::WaitOnly.triggers());
    assert!(ActionMode::WaitOnly.waits());
  }

  #[test]
  fn test_action_mode_parse() {
    assert_eq!(
      "wait-only".parse::<ActionMode>().unwrap(),
      ActionMode::WaitOnly
    );
    assert_eq!(
      ActionMode::TriggerOnly
        .to_string()
        .parse::<ActionMode>()
        .unwrap(),
      ActionMode::TriggerOnly
    );

    let err = "trigger".parse::<ActionMode>().unwrap_err();
    assert!(matches!(err, ConfigError::InvalidAction { value } if value == "trigger"));
  }
}
