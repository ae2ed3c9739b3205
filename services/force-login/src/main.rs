//! force-login
//!
//! Logs in to a Salesforce org with the configured grant and optionally
//! issues one authenticated GET:
//!
//! ```text
//! force-login --config force-login.toml --get /services/data/v59.0/limits
//! ```
//!
//! With a `[token_cache]` section the token is shared through a cache file
//! and refreshed by `FileTokenProvider`; otherwise the direct grant is used.

mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use force_auth::{AuthResponse, Client, FileTokenProvider};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

/// Value following `flag` on the command line.
fn arg_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str())
}

fn build_client(config: &Config) -> Result<Client> {
    let grant = config.grant().context("resolving grant secrets")?;

    let mut builder = Client::builder(config.session.clone(), grant).authentication_callback(
        Arc::new(|response: &AuthResponse| {
            info!(
                instance_url = response.instance_url.as_deref().unwrap_or(""),
                issued_at = response
                    .extra
                    .get("issued_at")
                    .and_then(|v| v.as_str())
                    .unwrap_or(""),
                "login succeeded"
            );
        }),
    );
    if let Some(cache) = &config.token_cache {
        let provider = FileTokenProvider::new(cache.path.clone());
        info!(path = %provider.path().display(), "using token cache");
        builder = builder.token_provider(Arc::new(provider));
    }
    builder.build().context("building client")
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let config_path = Config::resolve_path(arg_value(&args, "--config"));
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        host = %config.session.host,
        grant = ?config.grant.kind,
        proxy = config.session.proxy_uri.is_some(),
        "configuration loaded"
    );

    let client = build_client(&config)?;
    let auth = client.authenticate().await.context("authentication failed")?;
    let credentials = client.session().credentials().await;
    info!(
        instance_url = credentials.instance_url.as_deref().unwrap_or(""),
        token_len = auth.access_token.len(),
        "session ready"
    );

    if let Some(path) = arg_value(&args, "--get") {
        let response = client
            .get(path)
            .await
            .with_context(|| format!("GET {path} failed"))?;
        println!("{}", response.text());

        match client.limits().await {
            Some(limits) => info!(used = limits.used, max = limits.max, "api usage"),
            None => warn!("response carried no api usage header"),
        }
    }

    Ok(())
}
