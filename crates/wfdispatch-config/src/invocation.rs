use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::credentials::Credentials;
use crate::enums::{ActionMode, FailurePolicy, RunListScope};
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.github.com";
pub const DEFAULT_SERVER_URL: &str = "https://github.com";

/// A repository in `owner/name` form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepoRef {
  pub owner: String,
  pub name: String,
}

impl RepoRef {
  pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
    Self {
      owner: owner.into(),
      name: name.into(),
    }
  }
}

impl fmt::Display for RepoRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}/{}", self.owner, self.name)
  }
}

impl FromStr for RepoRef {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let invalid = || ConfigError::InvalidRepository {
      value: s.to_string(),
    };

    let (owner, name) = s.trim().split_once('/').ok_or_else(invalid)?;
    if owner.is_empty() || name.is_empty() || name.contains('/') {
      return Err(invalid());
    }

    Ok(Self::new(owner, name))
  }
}

/// Numeric id of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for RunId {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().parse::<u64>() {
      Ok(id) if id > 0 => Ok(Self(id)),
      _ => Err(ConfigError::InvalidRunId {
        value: s.to_string(),
      }),
    }
  }
}

/// Settings for discovering the run created by a dispatch.
#[derive(Debug, Clone)]
pub struct LocatorConfig {
  /// Pause between runs listing attempts.
  pub polling_interval: Duration,
  /// Number of listing attempts before giving up.
  pub max_polling_attempts: u32,
  /// Run name filter, matched literally or as a regular expression.
  pub run_pattern: Option<String>,
  pub scope: RunListScope,
}

impl Default for LocatorConfig {
  fn default() -> Self {
    Self {
      polling_interval: Duration::from_secs(5),
      max_polling_attempts: 12,
      run_pattern: None,
      scope: RunListScope::default(),
    }
  }
}

/// Everything a single invocation needs.
///
/// Built once by the binary (or a test) and only read afterwards.
#[derive(Debug, Clone)]
pub struct InvocationConfig {
  pub credentials: Credentials,
  /// Target repository, `owner/repo`. Validated when a phase needs it.
  pub repo: String,
  /// Workflow file name or numeric workflow id.
  pub workflow_id: String,
  /// Branch or tag the run is dispatched on.
  pub git_ref: String,
  /// Workflow dispatch inputs.
  pub inputs: HashMap<String, serde_json::Value>,
  /// Pause between run status polls.
  pub wait_interval: Duration,
  /// Overall deadline for the run to finish.
  pub timeout: Duration,
  pub mode: ActionMode,
  pub failure_policy: FailurePolicy,
  /// Existing run to wait on (required for `wait-only`).
  pub run_id: Option<RunId>,
  pub locator: LocatorConfig,
  /// REST API root.
  pub api_url: String,
  /// Web root used for run links.
  pub server_url: String,
  /// Repository the process runs in (`GITHUB_REPOSITORY`).
  pub ambient_repository: Option<String>,
}

impl InvocationConfig {
  pub fn new(
    credentials: Credentials,
    repo: impl Into<String>,
    workflow_id: impl Into<String>,
  ) -> Self {
    Self {
      credentials,
      repo: repo.into(),
      workflow_id: workflow_id.into(),
      git_ref: "main".to_string(),
      inputs: HashMap::new(),
      wait_interval: Duration::from_secs(10),
      timeout: Duration::from_secs(60 * 60),
      mode: ActionMode::default(),
      failure_policy: FailurePolicy::default(),
      run_id: None,
      locator: LocatorConfig::default(),
      api_url: DEFAULT_API_URL.to_string(),
      server_url: DEFAULT_SERVER_URL.to_string(),
      ambient_repository: None,
    }
  }

  /// Parse the `inputs` action input (a JSON object, empty means none).
  pub fn parse_inputs(input: &str) -> Result<HashMap<String, serde_json::Value>, ConfigError> {
    if input.trim().is_empty() {
      return Ok(HashMap::new());
    }

    serde_json::from_str(input).map_err(|e| ConfigError::InvalidInputs {
      message: e.to_string(),
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_repo_ref_parse() {
    let repo: RepoRef = "octo/hello".parse().unwrap();
    assert_eq!(repo.owner, "octo");
    assert_eq!(repo.name, "hello");
    assert_eq!(repo.to_string(), "octo/hello");

    for bad in ["", "octo", "octo/", "/hello", "a/b/c"] {
      assert!(bad.parse::<RepoRef>().is_err(), "accepted {:?}", bad);
    }
  }

  #[test]
  fn test_run_id_parse() {
    assert_eq!("12345".parse::<RunId>().unwrap(), RunId(12345));
    assert!("0".parse::<RunId>().is_err());
    assert!("abc".parse::<RunId>().is_err());
    assert!("".parse::<RunId>().is_err());
  }

  #[test]
  fn test_defaults() {
    let config = InvocationConfig::new(Credentials::token("t"), "o/r", "deploy.yml");
    assert_eq!(config.git_ref, "main");
    assert_eq!(config.wait_interval, Duration::from_secs(10));
    assert_eq!(config.timeout, Duration::from_secs(3600));
    assert_eq!(config.locator.max_polling_attempts, 12);
    assert_eq!(config.locator.polling_interval, Duration::from_secs(5));
    assert_eq!(config.mode, ActionMode::TriggerAndWait);
    assert_eq!(config.failure_policy, FailurePolicy::Propagate);
  }

  #[test]
  fn test_parse_inputs() {
    assert!(InvocationConfig::parse_inputs("").unwrap().is_empty());

    let inputs = InvocationConfig::parse_inputs(r#"{"key": "value", "dry_run": true}"#).unwrap();
    assert_eq!(inputs["key"], "value");
    assert_eq!(inputs["dry_run"], true);

    assert!(InvocationConfig::parse_inputs("[1, 2]").is_err());
  }
}
