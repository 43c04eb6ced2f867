use super::headers::TokenHeaders;
use super::keys::DEFAULT_ISSUER;

/// Upper bound for either token lifetime (10 years)
pub const MAX_TTL_SECS: i64 = 10 * 365 * 86400;

/// Token lifetimes, issuer and transport settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub issuer: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    /// Clock skew tolerated when checking `exp`
    pub leeway_secs: i64,
    pub headers: TokenHeaders,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            issuer: DEFAULT_ISSUER.to_string(),
            access_ttl_secs: 3600, // 1 hour
            refresh_ttl_secs: 86400 * 7, // 7 days
            leeway_secs: 30,
            headers: TokenHeaders::default(),
        }
    }
}
