//! Authenticated access to the GitHub API for one invocation.

use wfdispatch_auth::{AuthError, TokenBroker};
use wfdispatch_config::Credentials;
use wfdispatch_github::GithubClient;

/// A client, a token broker, and the credentials to present.
///
/// A token is resolved for every request so a long wait never outlives the
/// installation token it started with.
#[derive(Clone, Copy)]
pub struct ApiSession<'a> {
  client: &'a GithubClient,
  broker: &'a TokenBroker,
  credentials: &'a Credentials,
}

impl<'a> ApiSession<'a> {
  pub fn new(
    client: &'a GithubClient,
    broker: &'a TokenBroker,
    credentials: &'a Credentials,
  ) -> Self {
    Self {
      client,
      broker,
      credentials,
    }
  }

  pub fn client(&self) -> &'a GithubClient {
    self.client
  }

  /// Bearer token for the next request.
  pub async fn token(&self) -> Result<String, AuthError> {
    self.broker.token(self.credentials).await
  }
}
