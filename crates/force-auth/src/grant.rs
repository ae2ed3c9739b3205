//! OAuth grants posted to the token endpoint

use common::Secret;

/// Identity proof sent to `/services/oauth2/token`.
///
/// Secrets are wrapped so a `Grant` can be logged with `?grant` safely.
#[derive(Debug, Clone)]
pub enum Grant {
    /// Username-password flow. The security token, when present, is appended
    /// to the password as the token endpoint expects.
    Password {
        username: String,
        password: Secret<String>,
        security_token: Option<Secret<String>>,
        client_id: String,
        client_secret: Secret<String>,
    },
    /// Refresh token flow.
    RefreshToken {
        refresh_token: Secret<String>,
        client_id: String,
        client_secret: Option<Secret<String>>,
    },
    /// Client credentials flow (integration user bound to a connected app).
    ClientCredentials {
        client_id: String,
        client_secret: Secret<String>,
    },
}

impl Grant {
    pub fn grant_type(&self) -> &'static str {
        match self {
            Grant::Password { .. } => "password",
            Grant::RefreshToken { .. } => "refresh_token",
            Grant::ClientCredentials { .. } => "client_credentials",
        }
    }

    /// Form parameters for the token request, `grant_type` first.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("grant_type", self.grant_type().to_string())];
        match self {
            Grant::Password {
                username,
                password,
                security_token,
                client_id,
                client_secret,
            } => {
                let mut full_password = password.expose().clone();
                if let Some(token) = security_token {
                    full_password.push_str(token.expose());
                }
                params.push(("client_id", client_id.clone()));
                params.push(("client_secret", client_secret.expose().clone()));
                params.push(("username", username.clone()));
                params.push(("password", full_password));
            }
            Grant::RefreshToken {
                refresh_token,
                client_id,
                client_secret,
            } => {
                params.push(("refresh_token", refresh_token.expose().clone()));
                params.push(("client_id", client_id.clone()));
                if let Some(secret) = client_secret {
                    params.push(("client_secret", secret.expose().clone()));
                }
            }
            Grant::ClientCredentials {
                client_id,
                client_secret,
            } => {
                params.push(("client_id", client_id.clone()));
                params.push(("client_secret", client_secret.expose().clone()));
            }
        }
        params
    }
}
