//! Credential errors.

use wfdispatch_github::ApiError;

/// Errors that can occur while resolving a bearer token.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
  /// App credentials cannot be used as given.
  #[error("invalid app credentials: {message}")]
  InvalidCredentials { message: String },

  /// The app JWT could not be built or signed.
  #[error("failed to create app token: {source}")]
  CreateAppToken {
    #[source]
    source: jsonwebtoken::errors::Error,
  },

  /// Installation discovery failed on every attempt.
  #[error("failed to create app token: installation lookup failed after {attempts} attempts: {source}")]
  InstallationLookup {
    attempts: u32,
    #[source]
    source: ApiError,
  },

  /// The installation token exchange failed.
  #[error("failed to request installation token: {source}")]
  InstallationToken {
    #[source]
    source: ApiError,
  },
}

impl AuthError {
  /// Run conclusion reported for this failure.
  pub fn conclusion(&self) -> &'static str {
    match self {
      Self::InvalidCredentials { .. } => "invalid_input",
      Self::CreateAppToken { .. } | Self::InstallationLookup { .. } => {
        "failed_to_create_app_token"
      }
      Self::InstallationToken { .. } => "failed_to_request_app_token",
    }
  }
}
