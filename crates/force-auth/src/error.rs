//! Error types for authentication and authenticated requests

/// Errors from the authentication layer.
///
/// `Transport(Unauthorized)` is the only failure that triggers
/// reauthentication. `Authentication` comes from the token endpoint itself and
/// is never retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(String),

    #[error(transparent)]
    Transport(#[from] transport::Error),

    #[error("token endpoint request failed: {0}")]
    Http(String),

    #[error("invalid token response: {0}")]
    TokenParse(String),

    /// A token provider could not produce a token. Available to third-party
    /// `TokenProvider` implementations as well.
    #[error("token provider failed: {0}")]
    TokenProvider(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error(transparent)]
    Config(#[from] common::Error),
}

impl Error {
    /// Whether this is the upstream API rejecting the access token.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Transport(e) if e.is_unauthorized())
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
