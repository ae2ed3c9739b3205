//! HTTP executor abstraction for the authentication layer
//!
//! Defines the `Executor` trait the auth interceptor wraps, the request and
//! response values that flow through it, and the failure taxonomy. The one
//! distinction the interceptor cares about is `Error::Unauthorized`: any 401
//! from the upstream API must surface as that variant and nothing else.
//!
//! `ReqwestExecutor` is the production executor. `parse_api_usage` extracts
//! the `sforce-limit-info` usage counters from response headers.

pub mod reqwest_executor;
pub mod usage;

pub use reqwest_executor::{ExecutorOptions, ReqwestExecutor};
pub use usage::{ApiUsage, LIMIT_INFO_HEADER, parse_api_usage};

use bytes::Bytes;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Failures reported by an executor.
///
/// HTTP failures carry the response headers so outer layers (API usage
/// tracking) can still inspect them.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unauthorized (401): {body}")]
    Unauthorized { headers: HeaderMap, body: String },

    #[error("upstream returned {status}: {body}")]
    Status {
        status: StatusCode,
        headers: HeaderMap,
        body: String,
    },

    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl Error {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Unauthorized { .. })
    }

    /// Response headers, when the failure came from an HTTP response.
    pub fn headers(&self) -> Option<&HeaderMap> {
        match self {
            Error::Unauthorized { headers, .. } | Error::Status { headers, .. } => Some(headers),
            Error::Http(_) | Error::InvalidRequest(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// An outgoing API request.
///
/// `url` is either absolute or a path starting with `/`. Paths are resolved
/// against the session's instance URL by the auth interceptor before the
/// request reaches an executor.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

impl Request {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>, body: impl Into<Bytes>) -> Self {
        Self::new(Method::POST, url).with_body(body)
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Whether `url` still needs a base URL.
    pub fn is_relative(&self) -> bool {
        self.url.starts_with('/')
    }

    /// Replace the Authorization header with a Bearer token.
    pub fn set_bearer(&mut self, token: &str) -> Result<()> {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|e| Error::InvalidRequest(format!("invalid token value: {e}")))?;
        self.headers.insert(AUTHORIZATION, value);
        Ok(())
    }
}

/// A successful (2xx/3xx) upstream response.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    /// Body as UTF-8, with invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Sends requests to the remote API.
///
/// Uses `Pin<Box<dyn Future>>` return types so executors can be stacked as
/// trait objects (`Arc<dyn Executor>`), matching how the auth layer wraps them.
pub trait Executor: Send + Sync {
    fn execute(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + '_>>;
}

impl<E: Executor + ?Sized> Executor for Arc<E> {
    fn execute(&self, request: Request) -> Pin<Box<dyn Future<Output = Result<Response>> + Send + '_>> {
        (**self).execute(request)
    }
}
