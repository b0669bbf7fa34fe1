//! Installation discovery for GitHub App credentials.

use tracing::{info, instrument};
use wfdispatch_config::{AppCredentials, RepoRef};
use wfdispatch_github::GithubClient;

use crate::error::AuthError;
use crate::retry::RetryPolicy;

/// Where the installation id comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallationTarget {
  /// Configured directly; no lookup needed.
  Explicit(String),
  /// Installation on a user or organization account.
  Owner(String),
  /// Installation that covers one repository.
  Repository(RepoRef),
}

impl InstallationTarget {
  /// Decide how to find the installation for `app`.
  ///
  /// Without an explicit id or owner, the ambient repository (`owner/repo`)
  /// supplies the owner and, when no repositories are configured, the
  /// repository as well.
  pub fn plan(app: &AppCredentials, ambient_repository: Option<&str>) -> Result<Self, AuthError> {
    if let Some(id) = app.explicit_installation_id() {
      return Ok(Self::Explicit(id.to_string()));
    }

    let first_repository = app.repositories.first();

    match app.owner.as_deref() {
      Some(owner) => match first_repository {
        None => {
          info!(owner, "repositories not set, requesting token for all repositories of owner");
          Ok(Self::Owner(owner.to_string()))
        }
        Some(repo) => {
          info!(owner, repo = %repo, "requesting token for repository");
          Ok(Self::Repository(RepoRef::new(owner, repo)))
        }
      },
      None => {
        let ambient: RepoRef = ambient_repository
          .ok_or_else(|| AuthError::InvalidCredentials {
            message: "owner not set and no current repository is available".to_string(),
          })?
          .parse()
          .map_err(|e: wfdispatch_config::ConfigError| AuthError::InvalidCredentials {
            message: e.to_string(),
          })?;

        match first_repository {
          None => {
            info!(repo = %ambient, "owner not set, requesting token for the current repository");
            Ok(Self::Repository(ambient))
          }
          Some(repo) => {
            info!(owner = %ambient.owner, repo = %repo, "owner not set, using the current owner");
            Ok(Self::Repository(RepoRef::new(ambient.owner, repo)))
          }
        }
      }
    }
  }
}

/// Resolves the installation id an installation token is minted for.
#[derive(Debug, Clone)]
pub struct InstallationResolver {
  client: GithubClient,
  retry: RetryPolicy,
}

impl InstallationResolver {
  pub fn new(client: GithubClient, retry: RetryPolicy) -> Self {
    Self { client, retry }
  }

  /// Return the installation id for `app`, looking it up with `jwt` if needed.
  #[instrument(name = "resolve_installation", skip_all, fields(app_id = %app.app_id))]
  pub async fn resolve(
    &self,
    app: &AppCredentials,
    ambient_repository: Option<&str>,
    jwt: &str,
  ) -> Result<String, AuthError> {
    let target = InstallationTarget::plan(app, ambient_repository)?;

    let lookup = match &target {
      InstallationTarget::Explicit(id) => return Ok(id.clone()),
      InstallationTarget::Owner(owner) => {
        self
          .retry
          .run("owner installation lookup", |_| {
            self.client.user_installation(owner, jwt)
          })
          .await
      }
      InstallationTarget::Repository(repo) => {
        self
          .retry
          .run("repository installation lookup", |_| {
            self.client.repo_installation(repo, jwt)
          })
          .await
      }
    };

    let installation =
      lookup.map_err(|(attempts, source)| AuthError::InstallationLookup { attempts, source })?;

    info!(installation_id = installation.id, "installation resolved");
    Ok(installation.id.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn app() -> AppCredentials {
    AppCredentials::new("1", "key")
  }

  #[test]
  fn test_explicit_installation_wins() {
    let app = app()
      .with_installation_id("78910")
      .with_owner("o")
      .with_repositories(vec!["r".to_string()]);

    assert_eq!(
      InstallationTarget::plan(&app, Some("x/y")).unwrap(),
      InstallationTarget::Explicit("78910".to_string())
    );
  }

  #[test]
  fn test_owner_without_repositories() {
    let app = app().with_installation_id("").with_owner("o");

    assert_eq!(
      InstallationTarget::plan(&app, None).unwrap(),
      InstallationTarget::Owner("o".to_string())
    );
  }

  #[test]
  fn test_owner_with_repositories_uses_first() {
    let app = app()
      .with_owner("o")
      .with_repositories(vec!["first".to_string(), "second".to_string()]);

    assert_eq!(
      InstallationTarget::plan(&app, None).unwrap(),
      InstallationTarget::Repository(RepoRef::new("o", "first"))
    );
  }

  #[test]
  fn test_no_owner_uses_ambient_repository() {
    assert_eq!(
      InstallationTarget::plan(&app(), Some("amb/current")).unwrap(),
      InstallationTarget::Repository(RepoRef::new("amb", "current"))
    );
  }

  #[test]
  fn test_no_owner_with_repositories_uses_ambient_owner() {
    let app = app().with_repositories(vec!["other".to_string()]);

    assert_eq!(
      InstallationTarget::plan(&app, Some("amb/current")).unwrap(),
      InstallationTarget::Repository(RepoRef::new("amb", "other"))
    );
  }

  #[test]
  fn test_no_owner_and_no_ambient_repository() {
    let err = InstallationTarget::plan(&app(), None).unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials { .. }));

    let err = InstallationTarget::plan(&app(), Some("garbage")).unwrap_err();
    assert!(matches!(err, AuthError::InvalidCredentials { .. }));
  }
}
