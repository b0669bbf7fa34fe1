//! Bearer token resolution.

use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use wfdispatch_config::{AppCredentials, Credentials};
use wfdispatch_github::GithubClient;

use crate::cache::{INSTALLATION_TOKEN_KEY, TokenCache};
use crate::error::AuthError;
use crate::installation::InstallationResolver;
use crate::jwt::JwtIssuer;
use crate::retry::RetryPolicy;

/// How long before its reported expiry a token stops being reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SafetyMargin {
  /// A fixed buffer.
  Fixed(Duration),
  /// A share of the token's remaining lifetime, in percent.
  Proportional { percent: u8 },
}

impl Default for SafetyMargin {
  fn default() -> Self {
    Self::Fixed(Duration::from_secs(60))
  }
}

impl SafetyMargin {
  /// Cache TTL for a token with `lifetime` left, or `None` when the
  /// margin already covers the whole lifetime.
  pub fn ttl(&self, lifetime: Duration) -> Option<Duration> {
    let ttl = match *self {
      Self::Fixed(margin) => lifetime.checked_sub(margin)?,
      Self::Proportional { percent } => {
        let keep = 100u32.saturating_sub(u32::from(percent.min(100)));
        lifetime.checked_mul(keep)? / 100
      }
    };
    (!ttl.is_zero()).then_some(ttl)
  }
}

/// Produces bearer tokens from credentials, caching minted installation tokens.
///
/// Minting is single-flight: concurrent callers that miss the cache wait for
/// one exchange and then read its result.
pub struct TokenBroker {
  client: GithubClient,
  cache: TokenCache,
  resolver: InstallationResolver,
  margin: SafetyMargin,
  ambient_repository: Option<String>,
  mint_lock: Mutex<()>,
}

impl TokenBroker {
  pub fn new(client: GithubClient) -> Self {
    Self {
      resolver: InstallationResolver::new(client.clone(), RetryPolicy::default()),
      client,
      cache: TokenCache::new(),
      margin: SafetyMargin::default(),
      ambient_repository: None,
      mint_lock: Mutex::new(()),
    }
  }

  /// Share an existing cache.
  pub fn with_cache(mut self, cache: TokenCache) -> Self {
    self.cache = cache;
    self
  }

  /// Retry policy for installation lookups.
  pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
    self.resolver = InstallationResolver::new(self.client.clone(), retry);
    self
  }

  pub fn with_safety_margin(mut self, margin: SafetyMargin) -> Self {
    self.margin = margin;
    self
  }

  /// Repository the process runs in, used when app credentials name no owner.
  pub fn with_ambient_repository(mut self, repository: Option<String>) -> Self {
    self.ambient_repository = repository;
    self
  }

  pub fn cache(&self) -> &TokenCache {
    &self.cache
  }

  /// Resolve a bearer token for `credentials`.
  pub async fn token(&self, credentials: &Credentials) -> Result<String, AuthError> {
    match credentials {
      Credentials::Token(token) => Ok(token.clone()),
      Credentials::App(app) => self.app_token(app).await,
    }
  }

  async fn app_token(&self, app: &AppCredentials) -> Result<String, AuthError> {
    if let Some(token) = self.cache.get(INSTALLATION_TOKEN_KEY) {
      debug!("installation token cache hit");
      return Ok(token);
    }

    let _guard = self.mint_lock.lock().await;

    // Another caller may have minted while we waited
    if let Some(token) = self.cache.get(INSTALLATION_TOKEN_KEY) {
      debug!("installation token minted by concurrent caller");
      return Ok(token);
    }

    self.mint(app).await
  }

  #[instrument(name = "mint_installation_token", skip_all, fields(app_id = %app.app_id))]
  async fn mint(&self, app: &AppCredentials) -> Result<String, AuthError> {
    let jwt = JwtIssuer::new(app)?.issue()?;

    let installation_id = self
      .resolver
      .resolve(app, self.ambient_repository.as_deref(), &jwt)
      .await?;

    let token = self
      .client
      .create_installation_token(&installation_id, &jwt)
      .await
      .map_err(|source| AuthError::InstallationToken { source })?;

    let lifetime = (token.expires_at - Utc::now())
      .to_std()
      .unwrap_or(Duration::ZERO);

    match self.margin.ttl(lifetime) {
      Some(ttl) => {
        self
          .cache
          .set(INSTALLATION_TOKEN_KEY, token.token.clone(), ttl);
      }
      None => {
        warn!(
          expires_at = %token.expires_at,
          "installation token expires within the safety margin, not caching"
        );
      }
    }

    info!(
      installation_id = %installation_id,
      expires_at = %token.expires_at,
      "installation token minted"
    );

    Ok(token.token)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_fixed_margin() {
    let margin = SafetyMargin::Fixed(Duration::from_secs(60));
    assert_eq!(
      margin.ttl(Duration::from_secs(3600)),
      Some(Duration::from_secs(3540))
    );
    assert_eq!(margin.ttl(Duration::from_secs(60)), None);
    assert_eq!(margin.ttl(Duration::from_secs(30)), None);
  }

  #[test]
  fn test_proportional_margin() {
    let margin = SafetyMargin::Proportional { percent: 10 };
    assert_eq!(
      margin.ttl(Duration::from_secs(1000)),
      Some(Duration::from_secs(900))
    );
    assert_eq!(margin.ttl(Duration::ZERO), None);
    assert_eq!(
      SafetyMargin::Proportional { percent: 150 }.ttl(Duration::from_secs(1000)),
      None
    );
  }

  #[tokio::test]
  async fn test_static_token_passes_through() {
    let broker = TokenBroker::new(GithubClient::new("http://127.0.0.1:9").unwrap());
    let token = broker.token(&Credentials::token("ghp_static")).await.unwrap();

    assert_eq!(token, "ghp_static");
    assert_eq!(broker.cache().get(INSTALLATION_TOKEN_KEY), None);
  }
}
