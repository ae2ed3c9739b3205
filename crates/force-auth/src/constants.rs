//! Token endpoint and retry constants

/// OAuth token endpoint path, relative to the login host.
pub const TOKEN_PATH: &str = "/services/oauth2/token";

/// Login host used when the configuration does not name one.
pub const DEFAULT_HOST: &str = "login.salesforce.com";

/// REST API version used by `Client::data_path`.
pub const DEFAULT_API_VERSION: &str = "59.0";

/// Total attempts (initial + retries) per request when a token provider is
/// configured.
pub const MAX_TOKEN_PROVIDER_ATTEMPTS: u32 = 5;
