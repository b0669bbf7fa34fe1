//! Dispatch events and notifiers.
//!
//! The dispatcher reports progress through a [`DispatchNotifier`] so callers
//! can publish outputs, stream progress, or ignore it entirely.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use wfdispatch_config::RunId;

/// Events emitted while dispatching and waiting for a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DispatchEvent {
  /// The dispatch request was accepted.
  Dispatched {
    repo: String,
    workflow_id: String,
    git_ref: String,
  },

  /// The run created by the dispatch has been identified.
  RunLocated { run_id: RunId, html_url: String },

  /// A status poll observed the run.
  RunStatus {
    run_id: RunId,
    status: Option<String>,
    conclusion: Option<String>,
  },

  /// The invocation finished, successfully or not.
  Finished {
    run_id: Option<RunId>,
    conclusion: String,
  },
}

/// Receives dispatch events.
pub trait DispatchNotifier: Send + Sync {
  fn notify(&self, event: DispatchEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Default)]
pub struct NoopNotifier;

impl DispatchNotifier for NoopNotifier {
  fn notify(&self, _event: DispatchEvent) {}
}

/// Sends events to an unbounded channel.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
  // Unbounded so a slow consumer never stalls polling; one invocation emits
  // a handful of events per poll at most.
  sender: mpsc::UnboundedSender<DispatchEvent>,
}

impl ChannelNotifier {
  pub fn new(sender: mpsc::UnboundedSender<DispatchEvent>) -> Self {
    Self { sender }
  }
}

impl DispatchNotifier for ChannelNotifier {
  fn notify(&self, event: DispatchEvent) {
    // Receiver may have been dropped
    let _ = self.sender.send(event);
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_channel_notifier_forwards_events() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let notifier = ChannelNotifier::new(tx);

    notifier.notify(DispatchEvent::Finished {
      run_id: Some(RunId(7)),
      conclusion: "success".to_string(),
    });

    assert_eq!(
      rx.try_recv().unwrap(),
      DispatchEvent::Finished {
        run_id: Some(RunId(7)),
        conclusion: "success".to_string(),
      }
    );
  }

  #[test]
  fn test_channel_notifier_ignores_closed_receiver() {
    let (tx, rx) = mpsc::unbounded_channel();
    drop(rx);

    ChannelNotifier::new(tx).notify(DispatchEvent::RunStatus {
      run_id: RunId(1),
      status: Some("queued".to_string()),
      conclusion: None,
    });
  }
}
