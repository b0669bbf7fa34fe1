//! Wfdispatch Config
//!
//! Configuration types for a single dispatch invocation. The binary builds an
//! [`InvocationConfig`] from action inputs and environment variables; the
//! auth and runner crates only ever read it.
//!
//! Credentials are supplied as JSON, either a static token or a GitHub App
//! identity:
//!
//! ```json
//! { "token": "ghp_..." }
//! { "app": { "appId": 123, "privateKey": "-----BEGIN ...", "owner": "my-org" } }
//! ```

mod credentials;
mod duration;
mod enums;
mod error;
mod invocation;

pub use credentials::{AppCredentials, Credentials};
pub use duration::{parse_duration, parse_flag};
pub use enums::{ActionMode, FailurePolicy, RunListScope};
pub use error::ConfigError;
pub use invocation::{
  DEFAULT_API_URL, DEFAULT_SERVER_URL, InvocationConfig, LocatorConfig, RepoRef, RunId,
};
