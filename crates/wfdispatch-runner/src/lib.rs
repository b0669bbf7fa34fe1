//! Wfdispatch Runner
//!
//! Triggers a GitHub Actions workflow, identifies the run it created, and
//! waits for that run to finish.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        Dispatcher                           │
//! │  - run(config, cancel) → RunReport                          │
//! │  - mode dispatch, failure policy, DispatchEvent stream      │
//! └─────────────────────────────────────────────────────────────┘
//!            │                   │                    │
//!            ▼                   ▼                    ▼
//! ┌──────────────────┐ ┌───────────────────┐ ┌──────────────────┐
//! │     trigger      │ │    RunLocator     │ │ CompletionWaiter │
//! │  POST dispatches │ │  poll runs list,  │ │  poll run status │
//! │  (204, no retry) │ │  RunMatcher       │ │  until deadline  │
//! └──────────────────┘ └───────────────────┘ └──────────────────┘
//!            │                   │                    │
//!            └───────────────────┼────────────────────┘
//!                                ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │          ApiSession (GithubClient + TokenBroker)            │
//! │  - a bearer token is resolved before every request          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tokio_util::sync::CancellationToken;
//! use wfdispatch_runner::Dispatcher;
//!
//! let dispatcher = Dispatcher::from_config(&config)?;
//! let report = dispatcher.run(&config, CancellationToken::new()).await?;
//! println!("{:?} {}", report.run_id, report.conclusion);
//! ```

mod dispatch;
mod dispatcher;
mod error;
mod events;
mod locate;
mod session;
mod wait;

pub use dispatch::{parse_repo, trigger, validate_target};
pub use dispatcher::{Dispatcher, RunReport};
pub use error::DispatchError;
pub use events::{ChannelNotifier, DispatchEvent, DispatchNotifier, NoopNotifier};
pub use locate::{NamePattern, RunLocator, RunMatcher};
pub use session::ApiSession;
pub use wait::CompletionWaiter;
