//! API usage header parsing
//!
//! Every REST response carries `sforce-limit-info: api-usage=<used>/<max>`.
//! A missing or malformed header is not an error; callers just get `None`.

use regex::Regex;
use reqwest::header::HeaderMap;
use std::sync::LazyLock;

/// Response header carrying the org's API request counters.
pub const LIMIT_INFO_HEADER: &str = "sforce-limit-info";

/// Org-wide counter only; `per-app-api-usage=` entries must not match.
static API_USAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[\s,;])api-usage=(?<used>\d+)/(?<max>\d+)").expect("static regex is valid")
});

/// Requests consumed and allowed in the current 24h window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiUsage {
    pub used: u64,
    pub max: u64,
}

/// Extract API usage counters from response headers.
pub fn parse_api_usage(headers: &HeaderMap) -> Option<ApiUsage> {
    let value = headers.get(LIMIT_INFO_HEADER)?.to_str().ok()?;
    let captures = API_USAGE.captures(value)?;
    let used = captures["used"].parse().ok()?;
    let max = captures["max"].parse().ok()?;
    Some(ApiUsage { used, max })
}
