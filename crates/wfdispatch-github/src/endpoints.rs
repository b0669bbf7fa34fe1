//! Endpoint paths, relative to the API root.

use wfdispatch_config::{RepoRef, RunId};

pub fn workflow_dispatch(repo: &RepoRef, workflow_id: &str) -> String {
  format!("/repos/{}/actions/workflows/{}/dispatches", repo, workflow_id)
}

pub fn workflow_runs(repo: &RepoRef, workflow_id: &str) -> String {
  format!("/repos/{}/actions/workflows/{}/runs", repo, workflow_id)
}

pub fn repository_runs(repo: &RepoRef) -> String {
  format!("/repos/{}/actions/runs", repo)
}

pub fn run(repo: &RepoRef, run_id: RunId) -> String {
  format!("/repos/{}/actions/runs/{}", repo, run_id)
}

pub fn user_installation(owner: &str) -> String {
  format!("/users/{}/installation", owner)
}

pub fn repo_installation(repo: &RepoRef) -> String {
  format!("/repos/{}/installation", repo)
}

pub fn installation_access_tokens(installation_id: &str) -> String {
  format!("/app/installations/{}/access_tokens", installation_id)
}

/// Browser link to a run, e.g. `https://github.com/o/r/actions/runs/1`.
pub fn run_html_url(server_url: &str, repo: &RepoRef, run_id: RunId) -> String {
  format!(
    "{}/{}/actions/runs/{}",
    server_url.trim_end_matches('/'),
    repo,
    run_id
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_paths() {
    let repo = RepoRef::new("o", "r");
    assert_eq!(
      workflow_dispatch(&repo, "d.yml"),
      "/repos/o/r/actions/workflows/d.yml/dispatches"
    );
    assert_eq!(
      workflow_runs(&repo, "d.yml"),
      "/repos/o/r/actions/workflows/d.yml/runs"
    );
    assert_eq!(repository_runs(&repo), "/repos/o/r/actions/runs");
    assert_eq!(run(&repo, RunId(7)), "/repos/o/r/actions/runs/7");
    assert_eq!(user_installation("o"), "/users/o/installation");
    assert_eq!(repo_installation(&repo), "/repos/o/r/installation");
    assert_eq!(
      installation_access_tokens("42"),
      "/app/installations/42/access_tokens"
    );
  }

  #[test]
  fn test_run_html_url_trims_slash() {
    let repo = RepoRef::new("o", "r");
    assert_eq!(
      run_html_url("https://github.com/", &repo, RunId(12345)),
      "https://github.com/o/r/actions/runs/12345"
    );
  }
}
