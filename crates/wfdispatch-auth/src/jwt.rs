//! GitHub App JWTs.

use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use serde::{Deserialize, Serialize};
use wfdispatch_config::AppCredentials;

use crate::error::AuthError;

/// Backdating applied to `iat` for clock drift between us and GitHub.
const CLOCK_SKEW_SECS: i64 = 60;
/// GitHub rejects app JWTs that live longer than ten minutes.
const LIFETIME_SECS: i64 = 600;

/// Claims of an app JWT.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppClaims {
  pub iat: i64,
  pub exp: i64,
  pub iss: String,
}

/// Signs short-lived app assertions with the app's private key.
pub struct JwtIssuer {
  app_id: String,
  key: EncodingKey,
}

impl JwtIssuer {
  /// Load the signing key, preferring the environment override.
  pub fn new(app: &AppCredentials) -> Result<Self, AuthError> {
    let pem = app
      .private_key_override
      .as_deref()
      .unwrap_or(&app.private_key);

    let key = EncodingKey::from_rsa_pem(normalize_private_key(pem).as_bytes())
      .map_err(|source| AuthError::CreateAppToken { source })?;

    Ok(Self {
      app_id: app.app_id.clone(),
      key,
    })
  }

  /// Issue a JWT valid from one minute ago until ten minutes from now.
  pub fn issue(&self) -> Result<String, AuthError> {
    self.issue_at(Utc::now().timestamp())
  }

  pub(crate) fn issue_at(&self, now: i64) -> Result<String, AuthError> {
    let claims = AppClaims {
      iat: now - CLOCK_SKEW_SECS,
      exp: now + LIFETIME_SECS,
      iss: self.app_id.clone(),
    };

    encode(&Header::new(Algorithm::RS256), &claims, &self.key)
      .map_err(|source| AuthError::CreateAppToken { source })
  }
}

/// Keys pasted into JSON inputs often carry literal `\n` sequences.
fn normalize_private_key(key: &str) -> String {
  key.replace("\\n", "\n")
}
