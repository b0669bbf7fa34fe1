mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wfdispatch_runner::Dispatcher;

use crate::cli::Cli;
use crate::output::{OutputNotifier, RUN_CONCLUSION};

/// Environment variables that may carry the app private key, in order of precedence.
const PRIVATE_KEY_VARS: [&str; 2] = ["GITHUB_APP_PRIVATE_KEY", "GH_APP_PRIVATE_KEY"];

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.debug());

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(run(cli))
}

fn init_tracing(debug: bool) {
  let default = if debug { "debug" } else { "info" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();
}

async fn run(cli: Cli) -> Result<()> {
  let output = OutputNotifier::new(cli.output_file.clone());
  let private_key = PRIVATE_KEY_VARS
    .iter()
    .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()));

  let config = match cli.into_config(private_key) {
    Ok(config) => config,
    Err(e) => {
      // Still report a conclusion so later steps can branch on it
      if let Err(write_err) = output.set_output(RUN_CONCLUSION, "invalid_input") {
        warn!(error = %write_err, "failed to write output");
      }
      return Err(e.context("invalid action inputs"));
    }
  };

  info!(
    repo = %config.repo,
    workflow_id = %config.workflow_id,
    git_ref = %config.git_ref,
    mode = %config.mode,
    "starting"
  );

  let dispatcher = Dispatcher::from_config(&config)?.with_notifier(output);

  let cancel = CancellationToken::new();
  let on_signal = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      warn!("interrupt received, cancelling");
      on_signal.cancel();
    }
  });

  let report = dispatcher
    .run(&config, cancel)
    .await
    .context("action failed")?;

  match report.run_id {
    Some(run_id) => info!(run_id = %run_id, conclusion = %report.conclusion, "done"),
    None => info!(conclusion = %report.conclusion, "done"),
  }

  Ok(())
}
