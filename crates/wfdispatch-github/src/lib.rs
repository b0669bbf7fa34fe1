//! Wfdispatch GitHub
//!
//! Thin typed transport over the handful of GitHub REST endpoints wfdispatch
//! needs. Every call takes the bearer credential explicitly so callers can
//! resolve (and refresh) it per request.
//!
//! ```text
//! GithubClient
//! ├── dispatch_workflow      POST /repos/{o}/{r}/actions/workflows/{w}/dispatches  (204)
//! ├── list_workflow_runs     GET  /repos/{o}/{r}/actions/workflows/{w}/runs        (200)
//! ├── list_repository_runs   GET  /repos/{o}/{r}/actions/runs                      (200)
//! ├── get_run                GET  /repos/{o}/{r}/actions/runs/{id}                 (200)
//! ├── user_installation      GET  /users/{owner}/installation                      (200)
//! ├── repo_installation      GET  /repos/{o}/{r}/installation                      (200)
//! └── create_installation_token
//!                            POST /app/installations/{id}/access_tokens            (201)
//! ```

mod client;
pub mod endpoints;
mod error;
mod types;

pub use client::GithubClient;
pub use error::ApiError;
pub use types::{
  DispatchRequest, Installation, InstallationToken, STATUS_COMPLETED, WorkflowRun,
};
