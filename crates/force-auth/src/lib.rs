//! OAuth session management for Salesforce-style REST APIs
//!
//! Wraps an HTTP executor with an authentication interceptor that logs in,
//! refreshes and retries when the API rejects the access token. Two credential
//! strategies are supported, chosen once per client:
//!
//! - Direct: the interceptor posts a grant (password, refresh token or client
//!   credentials) to `/services/oauth2/token` and stores the returned token
//!   and instance URL itself.
//! - External: a caller-supplied `TokenProvider` receives the rejected token
//!   and `refresh` / `store` callbacks and owns the caching policy.
//!   `FileTokenProvider` is a ready-made provider that shares tokens through a
//!   file.
//!
//! Request flow:
//! 1. `Client::execute` → `Authentication::execute`
//! 2. Each attempt takes a snapshot of the token/instance URL pair from the
//!    `Session` and sets the Bearer header
//! 3. `ApiUsageLayer` records `sforce-limit-info` counters
//! 4. `ReqwestExecutor` sends the request and maps 401 to `Unauthorized`
//! 5. On `Unauthorized` the configured strategy reauthenticates

pub mod client;
pub mod constants;
pub mod error;
pub mod file_provider;
pub mod grant;
pub mod interceptor;
pub mod session;
pub mod strategy;
pub mod token;
pub mod usage;

pub use client::{Client, ClientBuilder};
pub use constants::*;
pub use error::{Error, Result};
pub use file_provider::{CachedToken, FileTokenProvider};
pub use grant::Grant;
pub use interceptor::{AuthState, Authentication};
pub use session::{ApiLimits, AuthenticationCallback, Session, SessionConfig, SessionCredentials};
pub use strategy::{CredentialStrategy, DirectStrategy, ExternalStrategy, TokenCallbacks, TokenProvider};
pub use token::{AuthResponse, TokenEndpoint};
pub use usage::ApiUsageLayer;
