//! Run completion polling.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument, warn};
use wfdispatch_config::{RepoRef, RunId};
use wfdispatch_github::WorkflowRun;

use crate::error::DispatchError;
use crate::events::{DispatchEvent, DispatchNotifier};
use crate::session::ApiSession;

const CONCLUSION_SUCCESS: &str = "success";

/// Polls one run until it completes or the deadline passes.
#[derive(Debug, Clone, Copy)]
pub struct CompletionWaiter {
  wait_interval: Duration,
  timeout: Duration,
}

impl CompletionWaiter {
  pub fn new(wait_interval: Duration, timeout: Duration) -> Self {
    Self {
      wait_interval,
      timeout,
    }
  }

  /// Wait for `run_id` to complete successfully.
  ///
  /// The run is polled at least once. Between polls the waiter sleeps for the
  /// wait interval, cut short at the deadline, so a timeout is reported at
  /// most one interval (plus one request) after `timeout`.
  #[instrument(name = "wait_for_run", skip_all, fields(repo = %repo, run_id = %run_id))]
  pub async fn wait(
    &self,
    session: &ApiSession<'_>,
    repo: &RepoRef,
    run_id: RunId,
    notifier: &dyn DispatchNotifier,
    cancel: &CancellationToken,
  ) -> Result<WorkflowRun, DispatchError> {
    let started = Instant::now();

    loop {
      let token = session.token().await?;
      let run = session
        .client()
        .get_run(repo, run_id, &token)
        .await
        .map_err(|source| DispatchError::WaitForWorkflow {
          run_id,
          conclusion: "failure".to_string(),
          source: Some(source),
        })?;

      notifier.notify(DispatchEvent::RunStatus {
        run_id,
        status: run.status.clone(),
        conclusion: run.conclusion.clone(),
      });

      if run.is_completed() {
        let conclusion = run.conclusion.as_deref().unwrap_or("unknown");
        if conclusion == CONCLUSION_SUCCESS {
          info!("run completed successfully");
          return Ok(run);
        }

        warn!(conclusion, "run completed unsuccessfully");
        return Err(DispatchError::WaitForWorkflow {
          run_id,
          conclusion: conclusion.to_string(),
          source: None,
        });
      }

      let remaining = self.timeout.saturating_sub(started.elapsed());
      if remaining.is_zero() {
        warn!(timeout = ?self.timeout, "run did not complete in time");
        return Err(DispatchError::Timeout {
          run_id,
          timeout: self.timeout,
        });
      }

      let pause = self.wait_interval.min(remaining);
      info!(
        status = run.status.as_deref().unwrap_or("unknown"),
        wait_ms = pause.as_millis() as u64,
        "run not completed yet"
      );

      tokio::select! {
        _ = cancel.cancelled() => {
          warn!("waiting cancelled");
          return Err(DispatchError::Cancelled);
        }
        _ = tokio::time::sleep(pause) => {}
      }
    }
  }
}
