use thiserror::Error;

/// Errors raised while building an invocation configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  /// Credentials input was not valid JSON.
  #[error("invalid JSON for credentials: {0}")]
  InvalidCredentialsJson(#[source] serde_json::Error),

  /// Neither a token nor app credentials were provided.
  #[error("you must provide either a 'token' or 'app' in credentials")]
  MissingCredentials,

  /// Both a token and app credentials were provided.
  #[error("credentials must contain either a 'token' or 'app', not both")]
  AmbiguousCredentials,

  /// App credentials are missing a required field.
  #[error("invalid GitHub App credentials: missing '{field}'")]
  IncompleteAppCredentials { field: &'static str },

  /// The private key is neither PEM nor base64-encoded PEM.
  #[error("invalid GitHub App private key: {message}")]
  InvalidPrivateKey { message: String },

  /// Repository is not in `owner/repo` form.
  #[error("invalid repository '{value}': expected 'owner/repo'")]
  InvalidRepository { value: String },

  /// Run id is not a positive integer.
  #[error("invalid run id '{value}'")]
  InvalidRunId { value: String },

  /// Unknown action mode.
  #[error("invalid action: {value}")]
  InvalidAction { value: String },

  /// Duration could not be parsed.
  #[error("invalid duration '{value}': {message}")]
  InvalidDuration { value: String, message: String },

  /// Workflow inputs were not a JSON object.
  #[error("invalid workflow inputs: {message}")]
  InvalidInputs { message: String },
}
