//! Action outputs.
//!
//! `run_id` is published as soon as the dispatched run is identified and
//! `run_conclusion` once the invocation finishes. A run id supplied up front
//! (wait-only) is published alongside the conclusion. Outputs are appended to the
//! file GitHub Actions names in `GITHUB_OUTPUT`, or printed to stdout.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, warn};
use wfdispatch_runner::{DispatchEvent, DispatchNotifier};

pub const RUN_ID: &str = "run_id";
pub const RUN_CONCLUSION: &str = "run_conclusion";

/// Publishes dispatch events as action outputs.
#[derive(Debug, Clone, Default)]
pub struct OutputNotifier {
  path: Option<PathBuf>,
  run_id_written: Arc<AtomicBool>,
}

impl OutputNotifier {
  /// Write to `path`, or stdout when `None`.
  pub fn new(path: Option<PathBuf>) -> Self {
    Self {
      path,
      run_id_written: Arc::default(),
    }
  }

  pub fn set_output(&self, name: &str, value: &str) -> io::Result<()> {
    let line = format!("{name}={value}\n");

    match &self.path {
      Some(path) => {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(line.as_bytes())
      }
      None => io::stdout().lock().write_all(line.as_bytes()),
    }
  }

  fn write(&self, name: &str, value: &str) {
    debug!(name, value, "set output");
    if let Err(e) = self.set_output(name, value) {
      warn!(name, error = %e, "failed to write output");
    }
  }
}

impl DispatchNotifier for OutputNotifier {
  fn notify(&self, event: DispatchEvent) {
    match event {
      DispatchEvent::RunLocated { run_id, .. } => {
        self.run_id_written.store(true, Ordering::SeqCst);
        self.write(RUN_ID, &run_id.to_string());
      }
      DispatchEvent::Finished { run_id, conclusion } => {
        if let Some(run_id) = run_id {
          if !self.run_id_written.swap(true, Ordering::SeqCst) {
            self.write(RUN_ID, &run_id.to_string());
          }
        }
        self.write(RUN_CONCLUSION, &conclusion);
      }
      DispatchEvent::Dispatched { .. } | DispatchEvent::RunStatus { .. } => {}
    }
  }
}
