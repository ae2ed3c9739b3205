//! Authenticated API client
//!
//! Composes the executor stack the way requests flow:
//! `Authentication` → `ApiUsageLayer` → `ReqwestExecutor`.
//!
//! With the Direct strategy the interceptor refreshes credentials on a 401 and
//! hands the failure back; `Client::execute` is the caller-level loop that
//! re-issues the request (`unauthorized_retries` times, default 1). With a
//! token provider the interceptor retries by itself and the client does not
//! add another loop.

use std::sync::Arc;

use bytes::Bytes;
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::{debug, info};
use transport::{ReqwestExecutor, Request, Response};

use crate::error::Result;
use crate::grant::Grant;
use crate::interceptor::Authentication;
use crate::session::{ApiLimits, AuthenticationCallback, Session, SessionConfig};
use crate::strategy::{CredentialStrategy, DirectStrategy, ExternalStrategy, TokenProvider};
use crate::token::{AuthResponse, TokenEndpoint};
use crate::usage::ApiUsageLayer;

pub struct ClientBuilder {
    config: SessionConfig,
    grant: Grant,
    token_provider: Option<Arc<dyn TokenProvider>>,
    authentication_callback: Option<AuthenticationCallback>,
    unauthorized_retries: u32,
}

impl ClientBuilder {
    /// Delegate token acquisition to `provider` (External strategy).
    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn authentication_callback(mut self, callback: AuthenticationCallback) -> Self {
        self.authentication_callback = Some(callback);
        self
    }

    /// Times a Direct-mode request is re-issued after a 401.
    pub fn unauthorized_retries(mut self, retries: u32) -> Self {
        self.unauthorized_retries = retries;
        self
    }

    pub fn build(self) -> Result<Client> {
        let mut session = Session::new(self.config)?;
        if let Some(callback) = self.authentication_callback {
            session = session.with_authentication_callback(callback);
        }
        let session = Arc::new(session);

        let options = session.config().executor_options();
        let executor = ReqwestExecutor::from_options(&options)?;
        let endpoint = TokenEndpoint::for_session(&session, self.grant)?;

        let strategy = match self.token_provider {
            Some(provider) => CredentialStrategy::External(ExternalStrategy::new(endpoint, provider)),
            None => CredentialStrategy::Direct(DirectStrategy::new(endpoint)),
        };
        info!(
            host = %session.config().host,
            external = strategy.is_external(),
            "client configured"
        );

        let auth = Authentication::new(
            ApiUsageLayer::new(executor, session.clone()),
            session.clone(),
            strategy,
        );
        Ok(Client {
            session,
            auth,
            unauthorized_retries: self.unauthorized_retries,
        })
    }
}

pub struct Client {
    session: Arc<Session>,
    auth: Authentication<ApiUsageLayer<ReqwestExecutor>>,
    unauthorized_retries: u32,
}

impl Client {
    pub fn builder(config: SessionConfig, grant: Grant) -> ClientBuilder {
        ClientBuilder {
            config,
            grant,
            token_provider: None,
            authentication_callback: None,
            unauthorized_retries: 1,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Log in now instead of on the first 401.
    pub async fn authenticate(&self) -> Result<AuthResponse> {
        self.auth.authenticate_now().await
    }

    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut retries = 0;
        loop {
            match self.auth.execute(request.clone()).await {
                Err(err)
                    if err.is_unauthorized()
                        && !self.auth.strategy().is_external()
                        && retries < self.unauthorized_retries =>
                {
                    retries += 1;
                    debug!(retries, "re-issuing request after reauthentication");
                }
                other => return other,
            }
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        self.execute(Request::get(path)).await
    }

    /// POST a JSON body.
    pub async fn post(&self, path: &str, body: impl Into<Bytes>) -> Result<Response> {
        let request = Request::post(path, body)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        self.execute(request).await
    }

    /// `/services/data/v{api_version}/{resource}`
    pub fn data_path(&self, resource: &str) -> String {
        format!(
            "/services/data/v{}/{}",
            self.session.config().api_version,
            resource.trim_start_matches('/')
        )
    }

    /// API usage reported by the most recent response.
    pub async fn limits(&self) -> Option<ApiLimits> {
        self.session.limits().await
    }
}
