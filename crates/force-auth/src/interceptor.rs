//! Authentication interceptor
//!
//! Wraps an executor and reacts to exactly one failure kind,
//! `transport::Error::Unauthorized`:
//!
//! - Direct strategy: log in once, then return the original unauthorized
//!   failure. Re-issuing the request is the caller's job (see
//!   `Client::execute`).
//! - External strategy: ask the token provider for a token after every
//!   unauthorized failure and re-issue the request, up to
//!   `MAX_TOKEN_PROVIDER_ATTEMPTS` attempts in total. The provider runs after
//!   the last failure too, so the next call starts with its token.
//!
//! Errors from the token endpoint or the provider abort immediately and are
//! never counted as an attempt. Every other executor outcome passes through.

use std::sync::Arc;

use tracing::{debug, warn};
use transport::{Executor, Request, Response};

use crate::constants::MAX_TOKEN_PROVIDER_ATTEMPTS;
use crate::error::Result;
use crate::session::Session;
use crate::strategy::{CredentialStrategy, DirectStrategy, ExternalStrategy};
use crate::token::AuthResponse;

/// Per-call interceptor state, reported in trace events.
///
/// Every call starts and ends in `Idle`; nothing is kept between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    Reauthenticating,
    Retrying,
}

pub struct Authentication<E> {
    inner: E,
    session: Arc<Session>,
    strategy: CredentialStrategy,
}

impl<E: Executor> Authentication<E> {
    pub fn new(inner: E, session: Arc<Session>, strategy: CredentialStrategy) -> Self {
        Self {
            inner,
            session,
            strategy,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn strategy(&self) -> &CredentialStrategy {
        &self.strategy
    }

    /// Send `request` through the inner executor, reauthenticating on 401.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        match &self.strategy {
            CredentialStrategy::Direct(direct) => self.execute_direct(direct, &request).await,
            CredentialStrategy::External(external) => {
                self.execute_external(external, &request).await
            }
        }
    }

    /// Force authentication outside of request flow (eager login).
    pub async fn authenticate_now(&self) -> Result<AuthResponse> {
        self.strategy.acquire_token(&self.session).await
    }

    async fn execute_direct(&self, direct: &DirectStrategy, request: &Request) -> Result<Response> {
        match self.attempt(request).await {
            Err(err) if err.is_unauthorized() => {
                debug!(state = ?AuthState::Reauthenticating, "unauthorized, logging in");
                direct.acquire_token(&self.session).await?;
                debug!(state = ?AuthState::Idle, "credentials refreshed, returning unauthorized to caller");
                Err(err)
            }
            other => other,
        }
    }

    async fn execute_external(
        &self,
        external: &ExternalStrategy,
        request: &Request,
    ) -> Result<Response> {
        let mut attempt = 1;
        loop {
            match self.attempt(request).await {
                Err(err) if err.is_unauthorized() => {
                    debug!(attempt, state = ?AuthState::Reauthenticating, "unauthorized, consulting token provider");
                    external.acquire_token(&self.session).await?;
                    if attempt >= MAX_TOKEN_PROVIDER_ATTEMPTS {
                        warn!(
                            attempts = MAX_TOKEN_PROVIDER_ATTEMPTS,
                            "still unauthorized after token provider retries"
                        );
                        return Err(err);
                    }
                    attempt += 1;
                    debug!(attempt, state = ?AuthState::Retrying, "retrying with provider token");
                }
                other => return other,
            }
        }
    }

    /// One trip through the inner executor with the session's current pair.
    async fn attempt(&self, request: &Request) -> Result<Response> {
        let credentials = self.session.credentials().await;
        let mut outgoing = request.clone();
        if let Some(token) = &credentials.access_token {
            outgoing.set_bearer(token)?;
        }
        if outgoing.is_relative() {
            outgoing.url = format!("{}{}", self.session.api_base_url(&credentials), outgoing.url);
        }
        Ok(self.inner.execute(outgoing).await?)
    }
}
