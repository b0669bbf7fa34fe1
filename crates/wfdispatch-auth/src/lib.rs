//! Wfdispatch Auth
//!
//! Turns a [`Credentials`](wfdispatch_config::Credentials) descriptor into a
//! bearer token for the GitHub API.
//!
//! # Architecture
//!
//! ```text
//! TokenBroker::token(credentials)
//! ├── Token(t)  -> t
//! └── App(app)
//!     ├── TokenCache hit -> cached installation token
//!     └── mint (single-flight)
//!         ├── JwtIssuer::issue            RS256, iat = now - 60s, exp = now + 600s
//!         ├── InstallationResolver        explicit id | owner lookup | repo lookup (retried)
//!         ├── GithubClient::create_installation_token
//!         └── TokenCache::set(ttl = lifetime - safety margin)
//! ```

mod broker;
mod cache;
mod error;
mod installation;
mod jwt;
mod retry;

pub use broker::{SafetyMargin, TokenBroker};
pub use cache::{CachedToken, INSTALLATION_TOKEN_KEY, TokenCache};
pub use error::AuthError;
pub use installation::{InstallationResolver, InstallationTarget};
pub use jwt::{AppClaims, JwtIssuer};
pub use retry::{RetryBackoff, RetryPolicy};
