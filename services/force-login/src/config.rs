//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Passwords, client secrets, refresh tokens and access tokens are read from
//! `SF_*` environment variables, never from the TOML file.

use common::Secret;
use force_auth::{Grant, SessionConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const PASSWORD_ENV: &str = "SF_PASSWORD";
pub const SECURITY_TOKEN_ENV: &str = "SF_SECURITY_TOKEN";
pub const CLIENT_SECRET_ENV: &str = "SF_CLIENT_SECRET";
pub const REFRESH_TOKEN_ENV: &str = "SF_REFRESH_TOKEN";
pub const ACCESS_TOKEN_ENV: &str = "SF_ACCESS_TOKEN";

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    pub grant: GrantConfig,
    /// Presence selects the token provider strategy.
    #[serde(default)]
    pub token_cache: Option<TokenCacheConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    Password,
    RefreshToken,
    ClientCredentials,
}

/// Non-secret grant settings
#[derive(Debug, Deserialize)]
pub struct GrantConfig {
    #[serde(rename = "type")]
    pub kind: GrantKind,
    pub client_id: String,
    #[serde(default)]
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenCacheConfig {
    pub path: PathBuf,
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        config.session.validate()?;

        if config.grant.client_id.trim().is_empty() {
            return Err(common::Error::Config("grant.client_id must not be empty".into()));
        }
        if config.grant.kind == GrantKind::Password && config.grant.username.is_none() {
            return Err(common::Error::Config(
                "grant.username is required for the password grant".into(),
            ));
        }

        if let Some(token) = Secret::from_env(ACCESS_TOKEN_ENV) {
            config.session.oauth_token = Some(token.expose().clone());
        }

        Ok(config)
    }

    /// Build the grant, reading its secrets from the environment.
    pub fn grant(&self) -> common::Result<Grant> {
        let client_id = self.grant.client_id.clone();
        match self.grant.kind {
            GrantKind::Password => Ok(Grant::Password {
                username: self.grant.username.clone().ok_or_else(|| {
                    common::Error::Config("grant.username is required for the password grant".into())
                })?,
                password: required_env(PASSWORD_ENV)?,
                security_token: Secret::from_env(SECURITY_TOKEN_ENV),
                client_id,
                client_secret: required_env(CLIENT_SECRET_ENV)?,
            }),
            GrantKind::RefreshToken => Ok(Grant::RefreshToken {
                refresh_token: required_env(REFRESH_TOKEN_ENV)?,
                client_id,
                client_secret: Secret::from_env(CLIENT_SECRET_ENV),
            }),
            GrantKind::ClientCredentials => Ok(Grant::ClientCredentials {
                client_id,
                client_secret: required_env(CLIENT_SECRET_ENV)?,
            }),
        }
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("force-login.toml")
    }
}

fn required_env(key: &str) -> common::Result<Secret<String>> {
    Secret::from_env(key).ok_or_else(|| common::Error::MissingEnv(key.to_string()))
}
