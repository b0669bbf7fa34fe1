//! Run discovery.
//!
//! The dispatch endpoint answers 204 with no body, so the run it created has
//! to be found by listing recent runs and picking the first one that looks
//! like ours. Two dispatches of the same workflow on the same ref in quick
//! succession can still be confused; a run name pattern narrows the match.

use regex::Regex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};
use wfdispatch_auth::AuthError;
use wfdispatch_config::{LocatorConfig, RepoRef, RunId, RunListScope};
use wfdispatch_github::{ApiError, WorkflowRun};

use crate::error::DispatchError;
use crate::session::ApiSession;

/// Run name filter: matches when the name contains the pattern literally or
/// matches it as a regular expression.
#[derive(Debug, Clone)]
pub struct NamePattern {
  literal: String,
  regex: Option<Regex>,
}

impl NamePattern {
  pub fn new(pattern: impl Into<String>) -> Self {
    let literal = pattern.into();
    let regex = match Regex::new(&literal) {
      Ok(regex) => Some(regex),
      Err(e) => {
        debug!(pattern = %literal, error = %e, "run pattern is not a valid regex, matching literally");
        None
      }
    };
    Self { literal, regex }
  }

  pub fn matches(&self, name: &str) -> bool {
    name.contains(&self.literal) || self.regex.as_ref().is_some_and(|r| r.is_match(name))
  }
}

/// Decides whether a listed run is the one a dispatch created.
#[derive(Debug, Clone)]
pub struct RunMatcher {
  git_ref: String,
  workflow_id: String,
  name: Option<NamePattern>,
}

impl RunMatcher {
  pub fn new(git_ref: impl Into<String>, workflow_id: impl Into<String>) -> Self {
    Self {
      git_ref: git_ref.into(),
      workflow_id: workflow_id.into(),
      name: None,
    }
  }

  /// Also require the run name to match `pattern`. Empty patterns are ignored.
  pub fn with_name_pattern(mut self, pattern: Option<&str>) -> Self {
    self.name = pattern.filter(|p| !p.is_empty()).map(NamePattern::new);
    self
  }

  pub fn matches(&self, run: &WorkflowRun) -> bool {
    run.head_branch.as_deref() == Some(self.git_ref.as_str())
      && self.same_workflow(run)
      && !run.is_completed()
      && self.name.as_ref().is_none_or(|pattern| {
        run
          .name
          .as_deref()
          .is_some_and(|name| pattern.matches(name))
      })
  }

  // Workflows may be named by file or by numeric id
  fn same_workflow(&self, run: &WorkflowRun) -> bool {
    if run.path.ends_with(&self.workflow_id) {
      return true;
    }
    match (self.workflow_id.parse::<u64>(), run.workflow_id) {
      (Ok(wanted), Some(actual)) => wanted == actual,
      _ => false,
    }
  }
}

/// Polls the runs listing until a matching run appears.
pub struct RunLocator<'a> {
  matcher: RunMatcher,
  workflow_id: &'a str,
  config: &'a LocatorConfig,
}

impl<'a> RunLocator<'a> {
  pub fn new(matcher: RunMatcher, workflow_id: &'a str, config: &'a LocatorConfig) -> Self {
    Self {
      matcher,
      workflow_id,
      config,
    }
  }

  /// Find the id of the dispatched run.
  ///
  /// An API failure aborts at once; running out of attempts fails without a
  /// cause.
  #[instrument(name = "locate_run", skip_all, fields(repo = %repo, workflow_id = %self.workflow_id))]
  pub async fn locate(
    &self,
    session: &ApiSession<'_>,
    repo: &RepoRef,
    cancel: &CancellationToken,
  ) -> Result<RunId, DispatchError> {
    let max_attempts = self.config.max_polling_attempts;

    for attempt in 1..=max_attempts {
      info!(attempt, max_attempts, "polling for run id");

      let runs = self.list(session, repo).await.map_err(|e| match e {
        ListError::Auth(err) => DispatchError::Credentials(err),
        ListError::Api(source) => DispatchError::DetermineRunId {
          message: format!("listing runs failed on attempt {attempt}"),
          source: Some(source),
        },
      })?;

      if let Some(run) = runs.iter().find(|run| self.matcher.matches(run)) {
        info!(run_id = %run.id, attempt, "run located");
        return Ok(run.id);
      }

      debug!(attempt, listed = runs.len(), "no matching run yet");

      if attempt < max_attempts {
        tokio::select! {
          _ = cancel.cancelled() => {
            warn!("run discovery cancelled");
            return Err(DispatchError::Cancelled);
          }
          _ = tokio::time::sleep(self.config.polling_interval) => {}
        }
      }
    }

    Err(DispatchError::DetermineRunId {
      message: format!("no matching run after {max_attempts} polling attempts"),
      source: None,
    })
  }

  async fn list(
    &self,
    session: &ApiSession<'_>,
    repo: &RepoRef,
  ) -> Result<Vec<WorkflowRun>, ListError> {
    let token = session.token().await.map_err(ListError::Auth)?;
    let client = session.client();

    let runs = match self.config.scope {
      RunListScope::Workflow => client.list_workflow_runs(repo, self.workflow_id, &token).await,
      RunListScope::Repository => client.list_repository_runs(repo, &token).await,
    };
    runs.map_err(ListError::Api)
  }
}

enum ListError {
  Auth(AuthError),
  Api(ApiError),
}

#[cfg(test)]
mod tests {
  use super::*;

  fn run(id: u64, name: &str, branch: &str, path: &str, status: &str) -> WorkflowRun {
    WorkflowRun {
      id: RunId(id),
      name: Some(name.to_string()),
      head_branch: Some(branch.to_string()),
      workflow_id: Some(161335),
      path: path.to_string(),
      status: Some(status.to_string()),
      conclusion: None,
      html_url: None,
    }
  }

  #[test]
  fn test_matches_branch_path_and_status() {
    let matcher = RunMatcher::new("main", "deploy.yml");

    assert!(matcher.matches(&run(1, "Deploy", "main", ".github/workflows/deploy.yml", "queued")));
    assert!(matcher.matches(&run(1, "Deploy", "main", ".github/workflows/deploy.yml", "in_progress")));
    assert!(!matcher.matches(&run(1, "Deploy", "dev", ".github/workflows/deploy.yml", "queued")));
    assert!(!matcher.matches(&run(1, "Deploy", "main", ".github/workflows/build.yml", "queued")));
    assert!(!matcher.matches(&run(1, "Deploy", "main", ".github/workflows/deploy.yml", "completed")));
  }

  #[test]
  fn test_missing_branch_never_matches() {
    let mut candidate = run(1, "Deploy", "main", ".github/workflows/deploy.yml", "queued");
    candidate.head_branch = None;

    assert!(!RunMatcher::new("main", "deploy.yml").matches(&candidate));
  }

  #[test]
  fn test_numeric_workflow_id() {
    let candidate = run(1, "Deploy", "main", ".github/workflows/deploy.yml", "queued");

    assert!(RunMatcher::new("main", "161335").matches(&candidate));
    assert!(!RunMatcher::new("main", "42").matches(&candidate));
  }

  #[test]
  fn test_literal_name_pattern() {
    let matcher = RunMatcher::new("main", "deploy.yml").with_name_pattern(Some("Production"));

    assert!(matcher.matches(&run(1, "Deploy to Production", "main", "deploy.yml", "queued")));
    assert!(!matcher.matches(&run(2, "Deploy to Staging", "main", "deploy.yml", "queued")));
  }

  #[test]
  fn test_regex_name_pattern() {
    let matcher = RunMatcher::new("main", "deploy.yml")
      .with_name_pattern(Some("^Deploy to (Production|Staging)$"));

    assert!(matcher.matches(&run(1, "Deploy to Production", "main", "deploy.yml", "queued")));
    assert!(matcher.matches(&run(2, "Deploy to Staging", "main", "deploy.yml", "queued")));
    assert!(!matcher.matches(&run(3, "Deploy to QA", "main", "deploy.yml", "queued")));
  }

  #[test]
  fn test_invalid_regex_falls_back_to_literal() {
    let pattern = NamePattern::new("release (v1");

    assert!(pattern.matches("nightly release (v1"));
    assert!(!pattern.matches("release v1"));
  }

  #[test]
  fn test_empty_pattern_is_ignored() {
    let matcher = RunMatcher::new("main", "deploy.yml").with_name_pattern(Some(""));
    let mut candidate = run(1, "Deploy", "main", "deploy.yml", "queued");
    candidate.name = None;

    assert!(matcher.matches(&candidate));
  }

  #[test]
  fn test_pattern_requires_a_name() {
    let matcher = RunMatcher::new("main", "deploy.yml").with_name_pattern(Some("Deploy"));
    let mut candidate = run(1, "Deploy", "main", "deploy.yml", "queued");
    candidate.name = None;

    assert!(!matcher.matches(&candidate));
  }
}
