use std::time::Duration;

use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;
use wfdispatch_config::{RepoRef, RunId};

use crate::endpoints;
use crate::error::ApiError;
use crate::types::{
  DispatchRequest, Installation, InstallationToken, RawInstallationToken, WorkflowRun,
  WorkflowRunList,
};

const API_VERSION: &str = "2022-11-28";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_ERROR_BODY: usize = 512;

/// Client for the GitHub REST API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct GithubClient {
  http: Client,
  api_url: String,
}

impl GithubClient {
  /// Create a client rooted at `api_url` (e.g. `https://api.github.com`).
  pub fn new(api_url: impl Into<String>) -> Result<Self, ApiError> {
    let mut headers = HeaderMap::new();
    headers.insert(
      ACCEPT,
      HeaderValue::from_static("application/vnd.github+json"),
    );
    headers.insert("x-github-api-version", HeaderValue::from_static(API_VERSION));
    headers.insert(
      USER_AGENT,
      HeaderValue::from_static(concat!("wfdispatch/", env!("CARGO_PKG_VERSION"))),
    );

    let http = Client::builder()
      .default_headers(headers)
      .timeout(REQUEST_TIMEOUT)
      .build()
      .map_err(ApiError::Client)?;

    Ok(Self {
      http,
      api_url: api_url.into().trim_end_matches('/').to_string(),
    })
  }

  pub fn api_url(&self) -> &str {
    &self.api_url
  }

  /// Start a workflow run. The API answers 204 with no body and no run id.
  pub async fn dispatch_workflow(
    &self,
    repo: &RepoRef,
    workflow_id: &str,
    body: &DispatchRequest<'_>,
    token: &str,
  ) -> Result<(), ApiError> {
    let path = endpoints::workflow_dispatch(repo, workflow_id);
    let request = self.http.post(self.url(&path)).json(body);

    self
      .execute("workflow dispatch", request, token, StatusCode::NO_CONTENT)
      .await?;
    Ok(())
  }

  /// Recent runs of one workflow, newest first.
  pub async fn list_workflow_runs(
    &self,
    repo: &RepoRef,
    workflow_id: &str,
    token: &str,
  ) -> Result<Vec<WorkflowRun>, ApiError> {
    let path = endpoints::workflow_runs(repo, workflow_id);
    self.list_runs(&path, token).await
  }

  /// Recent runs of every workflow in the repository, newest first.
  pub async fn list_repository_runs(
    &self,
    repo: &RepoRef,
    token: &str,
  ) -> Result<Vec<WorkflowRun>, ApiError> {
    let path = endpoints::repository_runs(repo);
    self.list_runs(&path, token).await
  }

  async fn list_runs(&self, path: &str, token: &str) -> Result<Vec<WorkflowRun>, ApiError> {
    const OPERATION: &str = "list runs";

    let response = self
      .execute(OPERATION, self.http.get(self.url(path)), token, StatusCode::OK)
      .await?;
    let list: WorkflowRunList = decode(OPERATION, response).await?;
    Ok(list.workflow_runs)
  }

  /// A single run, including its current status and conclusion.
  pub async fn get_run(
    &self,
    repo: &RepoRef,
    run_id: RunId,
    token: &str,
  ) -> Result<WorkflowRun, ApiError> {
    const OPERATION: &str = "run status";

    let path = endpoints::run(repo, run_id);
    let response = self
      .execute(OPERATION, self.http.get(self.url(&path)), token, StatusCode::OK)
      .await?;
    decode(OPERATION, response).await
  }

  /// Installation of the app on a user or organization account.
  pub async fn user_installation(&self, owner: &str, jwt: &str) -> Result<Installation, ApiError> {
    const OPERATION: &str = "owner installation lookup";

    let path = endpoints::user_installation(owner);
    let response = self
      .execute(OPERATION, self.http.get(self.url(&path)), jwt, StatusCode::OK)
      .await?;
    decode(OPERATION, response).await
  }

  /// Installation of the app that covers one repository.
  pub async fn repo_installation(
    &self,
    repo: &RepoRef,
    jwt: &str,
  ) -> Result<Installation, ApiError> {
    const OPERATION: &str = "repository installation lookup";

    let path = endpoints::repo_installation(repo);
    let response = self
      .execute(OPERATION, self.http.get(self.url(&path)), jwt, StatusCode::OK)
      .await?;
    decode(OPERATION, response).await
  }

  /// Exchange an app JWT for an installation access token.
  ///
  /// Succeeds only on 201 with both `token` and `expires_at` present.
  pub async fn create_installation_token(
    &self,
    installation_id: &str,
    jwt: &str,
  ) -> Result<InstallationToken, ApiError> {
    const OPERATION: &str = "installation token";

    let path = endpoints::installation_access_tokens(installation_id);
    let request = self.http.post(self.url(&path)).json(&serde_json::json!({}));
    let response = self
      .execute(OPERATION, request, jwt, StatusCode::CREATED)
      .await?;
    let raw: RawInstallationToken = decode(OPERATION, response).await?;

    match (raw.token.filter(|t| !t.is_empty()), raw.expires_at) {
      (Some(token), Some(expires_at)) => Ok(InstallationToken { token, expires_at }),
      _ => Err(ApiError::Decode {
        operation: OPERATION,
        message: "token or expiration time not found in the response".to_string(),
      }),
    }
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.api_url, path)
  }

  async fn execute(
    &self,
    operation: &'static str,
    request: RequestBuilder,
    token: &str,
    expected: StatusCode,
  ) -> Result<Response, ApiError> {
    let response = request
      .bearer_auth(token)
      .send()
      .await
      .map_err(|source| ApiError::Transport { operation, source })?;

    let status = response.status();
    debug!(operation, status = status.as_u16(), "github_response");

    if status != expected {
      let body = response.text().await.unwrap_or_default();
      return Err(ApiError::UnexpectedStatus {
        operation,
        status: status.as_u16(),
        body: truncate(body, MAX_ERROR_BODY),
      });
    }

    Ok(response)
  }
}

async fn decode<T: DeserializeOwned>(
  operation: &'static str,
  response: Response,
) -> Result<T, ApiError> {
  let bytes = response
    .bytes()
    .await
    .map_err(|source| ApiError::Transport { operation, source })?;

  serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode {
    operation,
    message: e.to_string(),
  })
}

fn truncate(mut body: String, max: usize) -> String {
  if body.len() > max {
    let mut end = max;
    while !body.is_char_boundary(end) {
      end -= 1;
    }
    body.truncate(end);
    body.push_str("...");
  }
  body
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_truncate_respects_char_boundaries() {
    assert_eq!(truncate("short".to_string(), 10), "short");
    assert_eq!(truncate("abcdef".to_string(), 3), "abc...");
    assert_eq!(truncate("héllo".to_string(), 2), "h...");
  }

  #[test]
  fn test_api_url_trailing_slash() {
    let client = GithubClient::new("https://api.example.test/").unwrap();
    assert_eq!(client.api_url(), "https://api.example.test");
    assert_eq!(
      client.url("/users/o/installation"),
      "https://api.example.test/users/o/installation"
    );
  }
}
