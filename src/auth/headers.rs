use axum::http::{header, HeaderMap, HeaderName};

pub const BEARER_PREFIX: &str = "Bearer ";

/// Header names the access and refresh tokens travel in
#[derive(Debug, Clone)]
pub struct TokenHeaders {
    pub access: HeaderName,
    pub refresh: HeaderName,
}

impl Default for TokenHeaders {
    fn default() -> Self {
        Self {
            access: header::AUTHORIZATION,
            refresh: HeaderName::from_static("refresh"),
        }
    }
}

/// Reads a token from the named header, with or without the `Bearer ` prefix.
/// Returns `None` when the header is absent, not ASCII or blank.
pub fn bearer_token<'a>(headers: &'a HeaderMap, name: &HeaderName) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?.trim_start();
    let token = value.strip_prefix(BEARER_PREFIX).unwrap_or(value).trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

pub fn as_bearer(token: &str) -> String {
    if token.starts_with(BEARER_PREFIX) {
        token.to_string()
    } else {
        format!("{}{}", BEARER_PREFIX, token)
    }
}
