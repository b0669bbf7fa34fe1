//! Dispatch-and-wait orchestration.

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};
use wfdispatch_auth::TokenBroker;
use wfdispatch_config::{FailurePolicy, InvocationConfig, RepoRef, RunId};
use wfdispatch_github::{GithubClient, endpoints};

use crate::dispatch::{parse_repo, trigger, validate_target};
use crate::error::DispatchError;
use crate::events::{DispatchEvent, DispatchNotifier, NoopNotifier};
use crate::locate::{RunLocator, RunMatcher};
use crate::session::ApiSession;
use crate::wait::CompletionWaiter;

const CONCLUSION_SUCCESS: &str = "success";

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
  /// The dispatched or awaited run, once known.
  pub run_id: Option<RunId>,
  /// `success`, or the conclusion of the failure that ended the invocation.
  pub conclusion: String,
}

/// Runs the phases an [`InvocationConfig`] asks for.
///
/// Generic over `N: DispatchNotifier` so callers choose how progress is
/// observed. `Dispatcher::new` discards events.
pub struct Dispatcher<N: DispatchNotifier = NoopNotifier> {
  client: GithubClient,
  broker: TokenBroker,
  notifier: N,
}

impl Dispatcher<NoopNotifier> {
  pub fn new(client: GithubClient, broker: TokenBroker) -> Self {
    Self {
      client,
      broker,
      notifier: NoopNotifier,
    }
  }

  /// Build a client and broker from the API root and ambient repository in
  /// `config`.
  pub fn from_config(config: &InvocationConfig) -> Result<Self, DispatchError> {
    let client = GithubClient::new(config.api_url.as_str()).map_err(DispatchError::Client)?;
    let broker = TokenBroker::new(client.clone())
      .with_ambient_repository(config.ambient_repository.clone());
    Ok(Self::new(client, broker))
  }
}

impl<N: DispatchNotifier> Dispatcher<N> {
  /// Replace the notifier.
  pub fn with_notifier<M: DispatchNotifier>(self, notifier: M) -> Dispatcher<M> {
    Dispatcher {
      client: self.client,
      broker: self.broker,
      notifier,
    }
  }

  pub fn broker(&self) -> &TokenBroker {
    &self.broker
  }

  /// Run the invocation.
  ///
  /// Under [`FailurePolicy::Suppress`] a failure is logged and returned as a
  /// report whose conclusion names the failure.
  #[instrument(
    name = "dispatch",
    skip_all,
    fields(repo = %config.repo, workflow_id = %config.workflow_id, mode = %config.mode)
  )]
  pub async fn run(
    &self,
    config: &InvocationConfig,
    cancel: CancellationToken,
  ) -> Result<RunReport, DispatchError> {
    let mut run_id = config.run_id;
    let result = self.execute(config, &mut run_id, &cancel).await;

    let conclusion = match &result {
      Ok(()) => CONCLUSION_SUCCESS.to_string(),
      Err(e) => e.conclusion().to_string(),
    };
    info!(conclusion = %conclusion, "run conclusion");

    self.notifier.notify(DispatchEvent::Finished {
      run_id,
      conclusion: conclusion.clone(),
    });

    match result {
      Ok(()) => Ok(RunReport { run_id, conclusion }),
      Err(e) => match config.failure_policy {
        FailurePolicy::Propagate => {
          error!(error = %e, conclusion = %conclusion, "dispatch failed");
          Err(e)
        }
        FailurePolicy::Suppress => {
          warn!(error = %e, conclusion = %conclusion, "dispatch failed, failure suppressed");
          Ok(RunReport { run_id, conclusion })
        }
      },
    }
  }

  async fn execute(
    &self,
    config: &InvocationConfig,
    run_id: &mut Option<RunId>,
    cancel: &CancellationToken,
  ) -> Result<(), DispatchError> {
    if !config.mode.triggers() && config.run_id.is_none() {
      return Err(DispatchError::Input {
        message: format!("run_id is required for action: {}", config.mode),
      });
    }

    let session = ApiSession::new(&self.client, &self.broker, &config.credentials);

    if config.mode.triggers() {
      let repo = validate_target(&config.repo, &config.workflow_id)?;
      let located = self.trigger_and_locate(&session, &repo, config, cancel).await?;
      *run_id = Some(located);
    }

    if config.mode.waits() {
      let id = run_id.ok_or_else(|| DispatchError::Input {
        message: "no run to wait for".to_string(),
      })?;
      let repo = parse_repo(&config.repo, &config.workflow_id)?;

      info!(
        run_id = %id,
        url = %endpoints::run_html_url(&config.server_url, &repo, id),
        "waiting for workflow run"
      );

      CompletionWaiter::new(config.wait_interval, config.timeout)
        .wait(&session, &repo, id, &self.notifier, cancel)
        .await?;
    }

    Ok(())
  }

  async fn trigger_and_locate(
    &self,
    session: &ApiSession<'_>,
    repo: &RepoRef,
    config: &InvocationConfig,
    cancel: &CancellationToken,
  ) -> Result<RunId, DispatchError> {
    trigger(
      session,
      repo,
      &config.workflow_id,
      &config.git_ref,
      &config.inputs,
    )
    .await?;

    self.notifier.notify(DispatchEvent::Dispatched {
      repo: repo.to_string(),
      workflow_id: config.workflow_id.clone(),
      git_ref: config.git_ref.clone(),
    });

    let matcher = RunMatcher::new(config.git_ref.as_str(), config.workflow_id.as_str())
      .with_name_pattern(config.locator.run_pattern.as_deref());
    let run_id = RunLocator::new(matcher, &config.workflow_id, &config.locator)
      .locate(session, repo, cancel)
      .await?;

    let html_url = endpoints::run_html_url(&config.server_url, repo, run_id);
    info!(run_id = %run_id, url = %html_url, "workflow run id determined");
    self
      .notifier
      .notify(DispatchEvent::RunLocated { run_id, html_url });

    Ok(run_id)
  }
}
