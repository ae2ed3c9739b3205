//! Credential strategies
//!
//! A client is configured with exactly one strategy for its lifetime:
//!
//! - `Direct`: post the grant, write the token/instance URL pair into the
//!   session, notify the authentication callback.
//! - `External`: hand the current token to a caller-supplied
//!   `TokenProvider` together with `refresh` / `store` callbacks. The
//!   provider decides whether a network refresh is needed at all.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use crate::error::Result;
use crate::session::Session;
use crate::token::{AuthResponse, TokenEndpoint};

/// Callbacks handed to a `TokenProvider`.
///
/// `refresh` performs exactly one token endpoint round-trip and returns the
/// new access token without touching the session. `store` writes a token
/// into the session and performs no I/O.
pub struct TokenCallbacks<'a> {
    endpoint: &'a TokenEndpoint,
    session: &'a Session,
}

impl<'a> TokenCallbacks<'a> {
    pub fn new(endpoint: &'a TokenEndpoint, session: &'a Session) -> Self {
        Self { endpoint, session }
    }

    pub async fn refresh(&self) -> Result<String> {
        let response = self.endpoint.request().await?;
        Ok(response.access_token)
    }

    pub async fn store(&self, access_token: String) {
        self.session.set_access_token(access_token).await;
    }
}

/// Caller-owned token acquisition policy (shared cache, single-flight
/// refresh across workers, ...).
///
/// `current_token` is the token that was just rejected, or `None` if the
/// session never had one. Implementations may call `refresh` any number of
/// times and should `store` the token the next attempt must use.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn TokenProvider>`).
pub trait TokenProvider: Send + Sync {
    fn authenticate<'a>(
        &'a self,
        current_token: Option<String>,
        callbacks: &'a TokenCallbacks<'a>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}

pub struct DirectStrategy {
    endpoint: TokenEndpoint,
}

impl DirectStrategy {
    pub fn new(endpoint: TokenEndpoint) -> Self {
        Self { endpoint }
    }

    /// Log in and replace the session's token/instance URL pair.
    ///
    /// On failure the session is left untouched.
    #[instrument(skip_all, fields(strategy = "direct"))]
    pub async fn acquire_token(&self, session: &Session) -> Result<AuthResponse> {
        let response = self.endpoint.request().await?;
        session
            .replace_credentials(
                response.access_token.clone(),
                response.instance_url.clone(),
            )
            .await;
        session.notify_authenticated(&response);
        info!(
            instance_url = response.instance_url.as_deref().unwrap_or(""),
            "authenticated"
        );
        Ok(response)
    }
}

pub struct ExternalStrategy {
    endpoint: TokenEndpoint,
    provider: Arc<dyn TokenProvider>,
}

impl ExternalStrategy {
    pub fn new(endpoint: TokenEndpoint, provider: Arc<dyn TokenProvider>) -> Self {
        Self { endpoint, provider }
    }

    /// Delegate to the provider and report whatever token the session holds
    /// afterwards (possibly unchanged).
    #[instrument(skip_all, fields(strategy = "external"))]
    pub async fn acquire_token(&self, session: &Session) -> Result<AuthResponse> {
        let current = session.access_token().await;
        let callbacks = TokenCallbacks::new(&self.endpoint, session);
        self.provider.authenticate(current, &callbacks).await?;

        let access_token = session.access_token().await.unwrap_or_default();
        debug!("token provider finished");
        Ok(AuthResponse::from_access_token(access_token))
    }
}

/// The strategy chosen at construction time.
pub enum CredentialStrategy {
    Direct(DirectStrategy),
    External(ExternalStrategy),
}

impl CredentialStrategy {
    pub fn is_external(&self) -> bool {
        matches!(self, CredentialStrategy::External(_))
    }

    pub async fn acquire_token(&self, session: &Session) -> Result<AuthResponse> {
        match self {
            CredentialStrategy::Direct(direct) => direct.acquire_token(session).await,
            CredentialStrategy::External(external) => external.acquire_token(session).await,
        }
    }
}
