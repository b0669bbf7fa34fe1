//! In-memory token cache with expiry.
//!
//! Entries are stored with an absolute expiry and checked on every read;
//! expired entries are dropped lazily.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;

/// Key under which the broker stores the current installation token.
pub const INSTALLATION_TOKEN_KEY: &str = "installation-token";

/// A cached secret and the instant it stops being served.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedToken {
  pub secret: String,
  pub expires_at_epoch_ms: i64,
}

impl CachedToken {
  pub fn is_expired_at(&self, now_epoch_ms: i64) -> bool {
    now_epoch_ms >= self.expires_at_epoch_ms
  }
}

/// TTL-aware secret cache. Clones share the same entries.
#[derive(Debug, Clone, Default)]
pub struct TokenCache {
  entries: Arc<RwLock<HashMap<String, CachedToken>>>,
}

impl TokenCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Get a secret if it has not expired.
  pub fn get(&self, key: &str) -> Option<String> {
    let now = Utc::now().timestamp_millis();

    {
      let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
      match entries.get(key) {
        Some(entry) if !entry.is_expired_at(now) => return Some(entry.secret.clone()),
        Some(_) => {}
        None => return None,
      }
    }

    // Expired: drop it unless a fresh value replaced it in the meantime
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    if entries.get(key).is_some_and(|entry| entry.is_expired_at(now)) {
      entries.remove(key);
    }
    None
  }

  /// Store a secret for `ttl`. A zero TTL removes the key instead.
  pub fn set(&self, key: &str, secret: String, ttl: Duration) {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);

    if ttl.is_zero() {
      entries.remove(key);
      return;
    }

    let ttl_ms = i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX);
    let expires_at_epoch_ms = Utc::now().timestamp_millis().saturating_add(ttl_ms);
    entries.insert(
      key.to_string(),
      CachedToken {
        secret,
        expires_at_epoch_ms,
      },
    );
  }

  /// The raw entry, expired or not.
  pub fn entry(&self, key: &str) -> Option<CachedToken> {
    let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
    entries.get(key).cloned()
  }

  /// Remove every entry.
  pub fn clear(&self) {
    let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
    entries.clear();
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_get_set_clear() {
    let cache = TokenCache::new();
    assert_eq!(cache.get("token"), None);

    cache.set("token", "one".to_string(), Duration::from_secs(60));
    assert_eq!(cache.get("token"), Some("one".to_string()));

    cache.set("token", "two".to_string(), Duration::from_secs(60));
    assert_eq!(cache.get("token"), Some("two".to_string()));

    cache.clear();
    assert_eq!(cache.get("token"), None);
  }

  #[test]
  fn test_zero_ttl_removes() {
    let cache = TokenCache::new();
    cache.set("token", "one".to_string(), Duration::from_secs(60));
    cache.set("token", "two".to_string(), Duration::ZERO);

    assert_eq!(cache.get("token"), None);
    assert_eq!(cache.entry("token"), None);
  }

  #[test]
  fn test_expired_entry_is_dropped() {
    let cache = TokenCache::new();
    cache.set("token", "short".to_string(), Duration::from_millis(20));
    assert!(cache.entry("token").is_some());

    std::thread::sleep(Duration::from_millis(40));

    assert_eq!(cache.get("token"), None);
    assert_eq!(cache.entry("token"), None);
  }

  #[test]
  fn test_clones_share_entries() {
    let cache = TokenCache::new();
    let other = cache.clone();
    cache.set("token", "shared".to_string(), Duration::from_secs(60));

    assert_eq!(other.get("token"), Some("shared".to_string()));
  }

  #[test]
  fn test_cached_token_expiry_boundary() {
    let token = CachedToken {
      secret: "s".to_string(),
      expires_at_epoch_ms: 1_000,
    };
    assert!(!token.is_expired_at(999));
    assert!(token.is_expired_at(1_000));
  }
}
