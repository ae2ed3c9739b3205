//! reqwest-backed executor
//!
//! Sends a `Request` as-is and classifies the outcome: 2xx/3xx is a
//! `Response`, 401 is `Error::Unauthorized`, any other status is
//! `Error::Status`, and transport failures (connect, timeout, body read) are
//! `Error::Http`. No retries happen here.

use crate::{Error, Executor, Request, Response, Result};
use reqwest::StatusCode;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Connection settings shared by API requests and token endpoint requests.
#[derive(Debug, Clone)]
pub struct ExecutorOptions {
    pub proxy_uri: Option<String>,
    pub timeout: Duration,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            proxy_uri: None,
            timeout: Duration::from_secs(60),
        }
    }
}

impl ExecutorOptions {
    /// Build a reqwest client honouring the proxy and timeout settings.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().timeout(self.timeout);
        if let Some(uri) = &self.proxy_uri {
            let proxy = reqwest::Proxy::all(uri)
                .map_err(|e| Error::InvalidRequest(format!("invalid proxy uri {uri}: {e}")))?;
            builder = builder.proxy(proxy);
        }
        builder
            .build()
            .map_err(|e| Error::Http(format!("building HTTP client: {e}")))
    }
}

pub struct ReqwestExecutor {
    client: reqwest::Client,
}

impl ReqwestExecutor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub fn from_options(options: &ExecutorOptions) -> Result<Self> {
        Ok(Self::new(options.build_client()?))
    }

    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: Request) -> Result<Response> {
        if request.is_relative() {
            return Err(Error::InvalidRequest(format!(
                "request url has no base: {}",
                request.url
            )));
        }

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let upstream = builder
            .send()
            .await
            .map_err(|e| Error::Http(format!("request failed: {e}")))?;

        let status = upstream.status();
        let headers = upstream.headers().clone();
        let body = upstream
            .bytes()
            .await
            .map_err(|e| Error::Http(format!("reading response body: {e}")))?;

        if status == StatusCode::UNAUTHORIZED {
            debug!("upstream rejected credentials");
            return Err(Error::Unauthorized {
                headers,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        if status.is_client_error() || status.is_server_error() {
            warn!(%status, "upstream returned error status");
            return Err(Error::Status {
                status,
                headers,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}

impl Executor for ReqwestExecutor {
    fn execute(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + '_>> {
        Box::pin(self.send(request))
    }
}
