//! Bounded retry with an explicit backoff.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::warn;

/// How the delay between attempts grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryBackoff {
  /// `base` after every failure.
  Constant,
  /// `base * attempt`.
  Linear,
  /// `base * 2^(attempt - 1)`.
  Exponential,
}

/// Attempt budget and backoff for a retried operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Total attempts, including the first.
  pub max_attempts: u32,
  pub backoff: RetryBackoff,
  pub base_delay: Duration,
  /// Upper bound for any single delay.
  pub max_delay: Duration,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    Self {
      max_attempts: 3,
      backoff: RetryBackoff::Exponential,
      base_delay: Duration::from_secs(1),
      max_delay: Duration::from_secs(30),
    }
  }
}

impl RetryPolicy {
  /// Retry without pausing between attempts.
  pub fn immediate(max_attempts: u32) -> Self {
    Self {
      max_attempts,
      backoff: RetryBackoff::Constant,
      base_delay: Duration::ZERO,
      max_delay: Duration::ZERO,
    }
  }

  /// Delay after failed attempt `attempt` (1-based).
  pub fn delay_for(&self, attempt: u32) -> Duration {
    let attempt = attempt.max(1);
    let delay = match self.backoff {
      RetryBackoff::Constant => self.base_delay,
      RetryBackoff::Linear => self.base_delay.saturating_mul(attempt),
      RetryBackoff::Exponential => {
        let factor = 2u32.saturating_pow(attempt - 1);
        self.base_delay.saturating_mul(factor)
      }
    };
    delay.min(self.max_delay)
  }

  /// Run `op` until it succeeds or the attempt budget is spent.
  ///
  /// `op` receives the 1-based attempt number. The last error is returned
  /// together with the number of attempts made.
  pub async fn run<T, E, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, (u32, E)>
  where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
  {
    let max_attempts = self.max_attempts.max(1);
    let mut attempt = 1;

    loop {
      match op(attempt).await {
        Ok(value) => return Ok(value),
        Err(e) => {
          warn!(
            operation,
            attempt,
            max_attempts,
            error = %e,
            "attempt failed"
          );

          if attempt >= max_attempts {
            return Err((attempt, e));
          }

          let delay = self.delay_for(attempt);
          if !delay.is_zero() {
            tokio::time::sleep(delay).await;
          }
          attempt += 1;
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::sync::atomic::{AtomicU32, Ordering};

  use super::*;

  fn policy(backoff: RetryBackoff) -> RetryPolicy {
    RetryPolicy {
      max_attempts: 5,
      backoff,
      base_delay: Duration::from_millis(100),
      max_delay: Duration::from_millis(350),
    }
  }

  #[test]
  fn test_delays() {
    let constant = policy(RetryBackoff::Constant);
    assert_eq!(constant.delay_for(1), Duration::from_millis(100));
    assert_eq!(constant.delay_for(4), Duration::from_millis(100));

    let linear = policy(RetryBackoff::Linear);
    assert_eq!(linear.delay_for(1), Duration::from_millis(100));
    assert_eq!(linear.delay_for(3), Duration::from_millis(300));
    assert_eq!(linear.delay_for(4), Duration::from_millis(350));

    let exponential = policy(RetryBackoff::Exponential);
    assert_eq!(exponential.delay_for(1), Duration::from_millis(100));
    assert_eq!(exponential.delay_for(2), Duration::from_millis(200));
    assert_eq!(exponential.delay_for(3), Duration::from_millis(350));
  }

  #[test]
  fn test_default_policy() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_attempts, 3);
    assert_eq!(policy.delay_for(1), Duration::from_secs(1));
    assert_eq!(policy.delay_for(2), Duration::from_secs(2));
  }

  #[tokio::test]
  async fn test_succeeds_after_failures() {
    let calls = AtomicU32::new(0);

    let result = RetryPolicy::immediate(3)
      .run("flaky", |attempt| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move {
          if attempt < 3 {
            Err(format!("boom {}", attempt))
          } else {
            Ok(attempt)
          }
        }
      })
      .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_returns_last_error_when_exhausted() {
    let calls = AtomicU32::new(0);

    let result: Result<(), _> = RetryPolicy::immediate(3)
      .run("broken", |attempt| {
        calls.fetch_add(1, Ordering::SeqCst);
        async move { Err(format!("boom {}", attempt)) }
      })
      .await;

    let (attempts, error) = result.unwrap_err();
    assert_eq!(attempts, 3);
    assert_eq!(error, "boom 3");
    assert_eq!(calls.load(Ordering::SeqCst), 3);
  }

  #[tokio::test]
  async fn test_zero_attempts_still_runs_once() {
    let calls = AtomicU32::new(0);

    let _: Result<(), _> = RetryPolicy::immediate(0)
      .run("once", |_| {
        calls.fetch_add(1, Ordering::SeqCst);
        async { Err("nope") }
      })
      .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
  }
}
