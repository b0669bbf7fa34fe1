use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;

const PEM_HEADER: &str = "-----BEGIN";

/// How the invocation authenticates against the GitHub API.
#[derive(Clone)]
pub enum Credentials {
  /// A pre-supplied bearer token, used as-is.
  Token(String),
  /// A GitHub App identity; installation tokens are minted on demand.
  App(AppCredentials),
}

/// GitHub App identity used to mint installation tokens.
#[derive(Clone, Default)]
pub struct AppCredentials {
  pub app_id: String,
  /// PEM private key. May still contain literal `\n` escapes.
  pub private_key: String,
  /// Explicit installation; skips installation discovery when set.
  pub installation_id: Option<String>,
  /// Account that owns the installation.
  pub owner: Option<String>,
  /// Repositories the token is requested for. Only the first is used for lookup.
  pub repositories: Vec<String>,
  /// Key taken from the environment; wins over `private_key` when present.
  pub private_key_override: Option<String>,
}

impl AppCredentials {
  pub fn new(app_id: impl Into<String>, private_key: impl Into<String>) -> Self {
    Self {
      app_id: app_id.into(),
      private_key: private_key.into(),
      ..Default::default()
    }
  }

  pub fn with_installation_id(mut self, installation_id: impl Into<String>) -> Self {
    self.installation_id = Some(installation_id.into());
    self
  }

  pub fn with_owner(mut self, owner: impl Into<String>) -> Self {
    self.owner = Some(owner.into());
    self
  }

  pub fn with_repositories(mut self, repositories: Vec<String>) -> Self {
    self.repositories = repositories;
    self
  }

  pub fn with_private_key_override(mut self, key: Option<String>) -> Self {
    self.private_key_override = key.filter(|k| !k.trim().is_empty());
    self
  }

  /// The explicit installation id, ignoring empty strings.
  pub fn explicit_installation_id(&self) -> Option<&str> {
    self
      .installation_id
      .as_deref()
      .map(str::trim)
      .filter(|id| !id.is_empty())
  }
}

impl fmt::Debug for AppCredentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("AppCredentials")
      .field("app_id", &self.app_id)
      .field("private_key", &"<redacted>")
      .field("installation_id", &self.installation_id)
      .field("owner", &self.owner)
      .field("repositories", &self.repositories)
      .field(
        "private_key_override",
        &self.private_key_override.as_ref().map(|_| "<redacted>"),
      )
      .finish()
  }
}

impl fmt::Debug for Credentials {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Token(_) => f.write_str("Token(<redacted>)"),
      Self::App(app) => f.debug_tuple("App").field(app).finish(),
    }
  }
}

#[derive(Deserialize)]
struct RawCredentials {
  #[serde(default)]
  token: Option<String>,
  #[serde(default)]
  app: Option<RawAppCredentials>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAppCredentials {
  #[serde(default, deserialize_with = "string_or_number")]
  app_id: Option<String>,
  #[serde(default)]
  private_key: Option<String>,
  #[serde(default, deserialize_with = "string_or_number")]
  installation_id: Option<String>,
  #[serde(default)]
  owner: Option<String>,
  #[serde(default)]
  repositories: Vec<String>,
}

/// GitHub hands out numeric ids; accept them as numbers or strings.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
  D: Deserializer<'de>,
{
  #[derive(Deserialize)]
  #[serde(untagged)]
  enum StringOrNumber {
    String(String),
    Number(u64),
  }

  Ok(
    Option::<StringOrNumber>::deserialize(deserializer)?.map(|v| match v {
      StringOrNumber::String(s) => s,
      StringOrNumber::Number(n) => n.to_string(),
    }),
  )
}

impl Credentials {
  /// Parse the `credentials` action input.
  pub fn from_json(input: &str) -> Result<Self, ConfigError> {
    let raw: RawCredentials =
      serde_json::from_str(input).map_err(ConfigError::InvalidCredentialsJson)?;

    let token = raw.token.filter(|t| !t.trim().is_empty());

    match (token, raw.app) {
      (Some(_), Some(_)) => Err(ConfigError::AmbiguousCredentials),
      (Some(token), None) => Ok(Self::Token(token)),
      (None, Some(app)) => Ok(Self::App(app.validate()?)),
      (None, None) => Err(ConfigError::MissingCredentials),
    }
  }

  pub fn token(token: impl Into<String>) -> Self {
    Self::Token(token.into())
  }
}

impl RawAppCredentials {
  fn validate(self) -> Result<AppCredentials, ConfigError> {
    let app_id = self
      .app_id
      .filter(|id| !id.trim().is_empty())
      .ok_or(ConfigError::IncompleteAppCredentials { field: "appId" })?;
    let private_key = self
      .private_key
      .filter(|k| !k.trim().is_empty())
      .ok_or(ConfigError::IncompleteAppCredentials {
        field: "privateKey",
      })?;

    Ok(AppCredentials {
      app_id,
      private_key: decode_private_key(&private_key)?,
      installation_id: self.installation_id,
      owner: self.owner.filter(|o| !o.trim().is_empty()),
      repositories: self
        .repositories
        .into_iter()
        .filter(|r| !r.trim().is_empty())
        .collect(),
      private_key_override: None,
    })
  }
}

/// Keys are passed either as PEM text or as base64-encoded PEM.
fn decode_private_key(key: &str) -> Result<String, ConfigError> {
  if key.contains(PEM_HEADER) {
    return Ok(key.to_string());
  }

  let compact: String = key.split_whitespace().collect();
  let bytes = STANDARD
    .decode(compact)
    .map_err(|e| ConfigError::InvalidPrivateKey {
      message: format!("not PEM and not base64: {}", e),
    })?;
  let decoded = String::from_utf8(bytes).map_err(|e| ConfigError::InvalidPrivateKey {
    message: format!("decoded key is not UTF-8: {}", e),
  })?;

  if !decoded.contains(PEM_HEADER) {
    return Err(ConfigError::InvalidPrivateKey {
      message: "decoded key has no PEM header".to_string(),
    });
  }

  Ok(decoded)
}
