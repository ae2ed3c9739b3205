//! Records `sforce-limit-info` counters on the session

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::trace;
use transport::{Executor, Request, Response, parse_api_usage};

use crate::session::Session;

/// Executor layer that copies API usage counters from every response
/// (including HTTP error responses) into the session.
pub struct ApiUsageLayer<E> {
    inner: E,
    session: Arc<Session>,
}

impl<E: Executor> ApiUsageLayer<E> {
    pub fn new(inner: E, session: Arc<Session>) -> Self {
        Self { inner, session }
    }

    async fn forward(&self, request: Request) -> transport::Result<Response> {
        let result = self.inner.execute(request).await;
        let headers = match &result {
            Ok(response) => Some(&response.headers),
            Err(err) => err.headers(),
        };
        if let Some(usage) = headers.and_then(parse_api_usage) {
            trace!(used = usage.used, max = usage.max, "api usage");
            self.session.set_limits(usage.max, usage.used).await;
        }
        result
    }
}

impl<E: Executor> Executor for ApiUsageLayer<E> {
    fn execute(
        &self,
        request: Request,
    ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + '_>> {
        Box::pin(self.forward(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{ApiLimits, SessionConfig};
    use bytes::Bytes;
    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderValue};
    use transport::LIMIT_INFO_HEADER;

    struct Fixed(Option<&'static str>, bool);

    impl Executor for Fixed {
        fn execute(
            &self,
            _request: Request,
        ) -> Pin<Box<dyn Future<Output = transport::Result<Response>> + Send + '_>> {
            let mut headers = HeaderMap::new();
            if let Some(value) = self.0 {
                headers.insert(LIMIT_INFO_HEADER, HeaderValue::from_static(value));
            }
            let fail = self.1;
            Box::pin(async move {
                if fail {
                    Err(transport::Error::Status {
                        status: StatusCode::BAD_REQUEST,
                        headers,
                        body: String::new(),
                    })
                } else {
                    Ok(Response {
                        status: StatusCode::OK,
                        headers,
                        body: Bytes::new(),
                    })
                }
            })
        }
    }

    fn session() -> Arc<Session> {
        Arc::new(Session::new(SessionConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn records_used_and_max() {
        let session = session();
        let layer = ApiUsageLayer::new(Fixed(Some("api-usage=12/15000"), false), session.clone());
        layer.execute(Request::get("https://x/")).await.unwrap();
        assert_eq!(
            session.limits().await,
            Some(ApiLimits { max: 15000, used: 12 })
        );
    }

    #[tokio::test]
    async fn missing_header_changes_nothing() {
        let session = session();
        session.set_limits(100, 1).await;
        let layer = ApiUsageLayer::new(Fixed(None, false), session.clone());
        layer.execute(Request::get("https://x/")).await.unwrap();
        assert_eq!(session.limits().await, Some(ApiLimits { max: 100, used: 1 }));
    }

    #[tokio::test]
    async fn error_responses_still_report_usage() {
        let session = session();
        let layer = ApiUsageLayer::new(Fixed(Some("api-usage=7/50"), true), session.clone());
        assert!(layer.execute(Request::get("https://x/")).await.is_err());
        assert_eq!(session.limits().await, Some(ApiLimits { max: 50, used: 7 }));
    }
}
