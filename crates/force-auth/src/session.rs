//! Shared session state
//!
//! One `Session` is owned by a client and shared (via `Arc`) with the auth
//! interceptor, both strategies and the API usage layer. The access token and
//! instance URL are kept in a single `SessionCredentials` value behind one
//! lock, so a request never pairs a token from one login with the instance
//! URL of another.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;
use transport::ExecutorOptions;

use crate::constants::{DEFAULT_API_VERSION, DEFAULT_HOST, TOKEN_PATH};
use crate::token::AuthResponse;

/// Invoked with the full token endpoint body after each successful Direct
/// login, e.g. to persist the session elsewhere.
pub type AuthenticationCallback = Arc<dyn Fn(&AuthResponse) + Send + Sync>;

/// Connection settings for a session.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_scheme")]
    pub scheme: String,
    #[serde(default)]
    pub proxy_uri: Option<String>,
    /// Pre-existing access token. Loaded from the environment, never from TOML.
    #[serde(skip)]
    pub oauth_token: Option<String>,
    #[serde(default)]
    pub instance_url: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            scheme: default_scheme(),
            proxy_uri: None,
            oauth_token: None,
            instance_url: None,
            api_version: default_api_version(),
            timeout_secs: default_timeout(),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> common::Result<()> {
        if self.host.trim().is_empty() {
            return Err(common::Error::Config("host must not be empty".into()));
        }
        if self.host.contains("://") {
            return Err(common::Error::Config(format!(
                "host must not include a scheme, got: {}",
                self.host
            )));
        }
        if self.scheme != "https" && self.scheme != "http" {
            return Err(common::Error::Config(format!(
                "scheme must be http or https, got: {}",
                self.scheme
            )));
        }
        if self.timeout_secs == 0 {
            return Err(common::Error::Config(
                "timeout_secs must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn executor_options(&self) -> ExecutorOptions {
        ExecutorOptions {
            proxy_uri: self.proxy_uri.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

/// Access token and instance URL, always read and written together.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCredentials {
    pub access_token: Option<String>,
    pub instance_url: Option<String>,
}

/// API request counters reported by the most recent response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiLimits {
    pub max: u64,
    pub used: u64,
}

pub struct Session {
    config: SessionConfig,
    credentials: RwLock<SessionCredentials>,
    limits: RwLock<Option<ApiLimits>>,
    authentication_callback: Option<AuthenticationCallback>,
}

impl Session {
    /// Create a session seeded with the configured token and instance URL.
    pub fn new(config: SessionConfig) -> common::Result<Self> {
        config.validate()?;
        let credentials = SessionCredentials {
            access_token: config.oauth_token.clone(),
            instance_url: config.instance_url.clone(),
        };
        Ok(Self {
            config,
            credentials: RwLock::new(credentials),
            limits: RwLock::new(None),
            authentication_callback: None,
        })
    }

    pub fn with_authentication_callback(mut self, callback: AuthenticationCallback) -> Self {
        self.authentication_callback = Some(callback);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Snapshot of the current token/instance URL pair.
    pub async fn credentials(&self) -> SessionCredentials {
        self.credentials.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.credentials.read().await.access_token.clone()
    }

    /// Replace the pair after a full login.
    ///
    /// Grants that do not return an instance URL keep the previous one; the
    /// write still happens under a single lock acquisition.
    pub async fn replace_credentials(&self, access_token: String, instance_url: Option<String>) {
        let mut credentials = self.credentials.write().await;
        if let Some(url) = instance_url {
            credentials.instance_url = Some(url);
        }
        credentials.access_token = Some(access_token);
        debug!(
            instance_url = credentials.instance_url.as_deref().unwrap_or(""),
            "session credentials replaced"
        );
    }

    /// Replace only the access token (token provider `store`).
    pub async fn set_access_token(&self, access_token: String) {
        self.credentials.write().await.access_token = Some(access_token);
    }

    pub async fn set_limits(&self, max: u64, used: u64) {
        *self.limits.write().await = Some(ApiLimits { max, used });
    }

    pub async fn limits(&self) -> Option<ApiLimits> {
        *self.limits.read().await
    }

    /// `{scheme}://{host}`, the base for login requests.
    pub fn login_url(&self) -> String {
        format!("{}://{}", self.config.scheme, self.config.host)
    }

    pub fn token_url(&self) -> String {
        format!("{}{TOKEN_PATH}", self.login_url())
    }

    /// Base URL for API requests made with `credentials`.
    ///
    /// Takes the snapshot as a parameter so the caller resolves the URL from
    /// the same pair it takes the token from.
    pub fn api_base_url(&self, credentials: &SessionCredentials) -> String {
        match &credentials.instance_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => self.login_url(),
        }
    }

    pub(crate) fn notify_authenticated(&self, response: &AuthResponse) {
        if let Some(callback) = &self.authentication_callback {
            callback(response);
        }
    }
}
