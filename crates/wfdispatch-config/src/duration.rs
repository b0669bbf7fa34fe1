//! Parsing for human-entered durations and flags.

use std::time::Duration;

use crate::error::ConfigError;

/// Parse a duration such as `10s`, `1h 30m` or `500ms`.
///
/// A bare integer is read as milliseconds.
pub fn parse_duration(value: &str) -> Result<Duration, ConfigError> {
  let trimmed = value.trim();

  if let Ok(ms) = trimmed.parse::<u64>() {
    return Ok(Duration::from_millis(ms));
  }

  humantime::parse_duration(trimmed).map_err(|e| ConfigError::InvalidDuration {
    value: value.to_string(),
    message: e.to_string(),
  })
}

/// Truthy action flag: `true` or `yes`, case-insensitive.
pub fn parse_flag(value: &str) -> bool {
  matches!(value.trim().to_lowercase().as_str(), "true" | "yes")
}
