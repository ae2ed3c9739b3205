//! Token endpoint client
//!
//! Posts the configured grant to `/services/oauth2/token` on the login host.
//! The reqwest client used here is separate from the API executor stack: a
//! 401 during login must never re-enter the auth interceptor.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::error::{Error, Result};
use crate::grant::Grant;
use crate::session::Session;

/// Successful token endpoint body.
///
/// Fields other than the token and instance URL (`id`, `issued_at`,
/// `signature`, `token_type`, `scope`, ...) are kept in `extra` so the
/// authentication callback sees the whole body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_url: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl AuthResponse {
    /// A response carrying only an access token.
    pub fn from_access_token(access_token: String) -> Self {
        Self {
            access_token,
            instance_url: None,
            extra: serde_json::Map::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct TokenErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

/// Render a failed token response as `"<error>: <error_description>"`.
///
/// Bodies without either field (HTML error pages, empty bodies) fall back to
/// the status and raw body.
fn error_message(status: StatusCode, body: &str) -> String {
    match serde_json::from_str::<TokenErrorBody>(body) {
        Ok(parsed) if parsed.error.is_some() || parsed.error_description.is_some() => format!(
            "{}: {}",
            parsed.error.unwrap_or_default(),
            parsed.error_description.unwrap_or_default()
        ),
        _ => format!("token endpoint returned {status}: {body}"),
    }
}

/// Grant plus the unintercepted HTTP client that posts it.
pub struct TokenEndpoint {
    client: reqwest::Client,
    url: String,
    grant: Grant,
}

impl TokenEndpoint {
    pub fn new(client: reqwest::Client, url: String, grant: Grant) -> Self {
        Self { client, url, grant }
    }

    /// Build an endpoint for the session's login host, using the same proxy
    /// and timeout settings as API requests.
    pub fn for_session(session: &Session, grant: Grant) -> Result<Self> {
        let client = session.config().executor_options().build_client()?;
        Ok(Self::new(client, session.token_url(), grant))
    }

    /// Perform one token request.
    ///
    /// Anything but HTTP 200 is `Error::Authentication`.
    #[instrument(skip_all, fields(grant_type = self.grant.grant_type()))]
    pub async fn request(&self) -> Result<AuthResponse> {
        let response = self
            .client
            .post(&self.url)
            .form(&self.grant.params())
            .send()
            .await
            .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Http(format!("reading token response: {e}")))?;

        if status != StatusCode::OK {
            let message = error_message(status, &body);
            warn!(%status, error = %message, "token endpoint rejected grant");
            return Err(Error::Authentication(message));
        }

        let parsed: AuthResponse = serde_json::from_str(&body)
            .map_err(|e| Error::TokenParse(format!("invalid token response: {e}")))?;
        debug!(
            has_instance_url = parsed.instance_url.is_some(),
            "token endpoint issued access token"
        );
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::Secret;

    fn password_grant() -> Grant {
        Grant::Password {
            username: "ops@example.com".into(),
            password: Secret::from("pw"),
            security_token: None,
            client_id: "cid".into(),
            client_secret: Secret::from("csecret"),
        }
    }

    fn endpoint(server: &mockito::Server) -> TokenEndpoint {
        TokenEndpoint::new(
            reqwest::Client::new(),
            format!("{}/services/oauth2/token", server.url()),
            password_grant(),
        )
    }

    #[test]
    fn auth_response_keeps_extra_fields() {
        let json = r#"{"access_token":"00D!AQ","instance_url":"https://na1.salesforce.com","id":"https://login.salesforce.com/id/00D/005","token_type":"Bearer","issued_at":"1700000000000"}"#;
        let response: AuthResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.access_token, "00D!AQ");
        assert_eq!(
            response.instance_url.as_deref(),
            Some("https://na1.salesforce.com")
        );
        assert_eq!(response.extra["token_type"], "Bearer");
        assert_eq!(response.extra.len(), 3);
    }

    #[test]
    fn error_message_formats_remote_error() {
        let message = error_message(
            StatusCode::BAD_REQUEST,
            r#"{"error":"invalid_grant","error_description":"bad creds"}"#,
        );
        assert_eq!(message, "invalid_grant: bad creds");
    }

    #[test]
    fn error_message_with_only_error_code() {
        let message = error_message(StatusCode::BAD_REQUEST, r#"{"error":"invalid_client_id"}"#);
        assert_eq!(message, "invalid_client_id: ");
    }

    #[test]
    fn error_message_falls_back_for_non_json_body() {
        let message = error_message(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(
            message,
            "token endpoint returned 502 Bad Gateway: <html>bad gateway</html>"
        );
    }

    #[tokio::test]
    async fn request_posts_form_encoded_grant() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/services/oauth2/token")
            .match_header("content-type", "application/x-www-form-urlencoded")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("grant_type".into(), "password".into()),
                mockito::Matcher::UrlEncoded("username".into(), "ops@example.com".into()),
                mockito::Matcher::UrlEncoded("password".into(), "pw".into()),
            ]))
            .with_status(200)
            .with_body(r#"{"access_token":"tok-1","instance_url":"https://na1.salesforce.com"}"#)
            .create_async()
            .await;

        let response = endpoint(&server).request().await.unwrap();
        assert_eq!(response.access_token, "tok-1");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_200_is_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/services/oauth2/token")
            .with_status(500)
            .with_body(r#"{"error":"invalid_grant","error_description":"bad creds"}"#)
            .create_async()
            .await;

        match endpoint(&server).request().await {
            Err(Error::Authentication(message)) => assert_eq!(message, "invalid_grant: bad creds"),
            other => panic!("expected Authentication error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn other_2xx_is_still_an_authentication_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/services/oauth2/token")
            .with_status(204)
            .create_async()
            .await;

        assert!(matches!(
            endpoint(&server).request().await,
            Err(Error::Authentication(_))
        ));
    }

    #[tokio::test]
    async fn malformed_success_body_is_parse_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/services/oauth2/token")
            .with_status(200)
            .with_body(r#"{"instance_url":"https://na1.salesforce.com"}"#)
            .create_async()
            .await;

        assert!(matches!(
            endpoint(&server).request().await,
            Err(Error::TokenParse(_))
        ));
    }
}
