use axum::http::HeaderName;
use thiserror::Error;
use tracing::info;

use crate::auth::{AuthConfig, SigningKey, TokenHeaders, MAX_TTL_SECS};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("JWT secret is not valid base64: {0}")]
    InvalidSecret(String),

    #[error("JWT secret too short: {actual} bytes after base64 decoding, need at least {required}")]
    SecretTooShort { actual: usize, required: usize },
}

/// Credentials for an administrator account created at startup
#[derive(Clone)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
}

/// Process configuration, read once at startup
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: Option<String>,
    pub cors_allowed_origin: String,
    pub signing_key: SigningKey,
    pub auth: AuthConfig,
    pub admin: Option<AdminSeed>,
}

impl AppConfig {
    /// Reads configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let signing_key = SigningKey::from_base64(&secret)?;

        let defaults = AuthConfig::default();
        let auth = AuthConfig {
            issuer: lookup("JWT_ISSUER").unwrap_or(defaults.issuer),
            access_ttl_secs: positive_secs(&lookup, "JWT_ACCESS_TTL_SECS", defaults.access_ttl_secs)?,
            refresh_ttl_secs: positive_secs(
                &lookup,
                "JWT_REFRESH_TTL_SECS",
                defaults.refresh_ttl_secs,
            )?,
            leeway_secs: parse_or(&lookup, "JWT_LEEWAY_SECS", defaults.leeway_secs)?,
            headers: TokenHeaders {
                access: header_or(&lookup, "ACCESS_TOKEN_HEADER", defaults.headers.access)?,
                refresh: header_or(&lookup, "REFRESH_TOKEN_HEADER", defaults.headers.refresh)?,
            },
        };

        if auth.leeway_secs < 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_LEEWAY_SECS",
                reason: "must not be negative".to_string(),
            });
        }

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) => Some(AdminSeed { username, password }),
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing("ADMIN_PASSWORD")),
            (None, Some(_)) => return Err(ConfigError::Missing("ADMIN_USERNAME")),
        };

        let config = Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            cors_allowed_origin: lookup("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".to_string()),
            signing_key,
            auth,
            admin,
        };

        info!(
            issuer = %config.auth.issuer,
            access_ttl_secs = config.auth.access_ttl_secs,
            refresh_ttl_secs = config.auth.refresh_ttl_secs,
            leeway_secs = config.auth.leeway_secs,
            persistent = config.database_url.is_some(),
            "Configuration loaded"
        );

        Ok(config)
    }
}

fn parse_or<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|e| ConfigError::Invalid {
            name,
            reason: format!("{}", e),
        }),
        None => Ok(default),
    }
}

fn positive_secs<F>(lookup: &F, name: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let secs = parse_or(lookup, name, default)?;
    if secs <= 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "must be a positive number of seconds".to_string(),
        });
    }
    if secs > MAX_TTL_SECS {
        return Err(ConfigError::Invalid {
            name,
            reason: format!("must not exceed {} seconds", MAX_TTL_SECS),
        });
    }
    Ok(secs)
}

fn header_or<F>(
    lookup: &F,
    name: &'static str,
    default: HeaderName,
) -> Result<HeaderName, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => HeaderName::from_bytes(raw.trim().as_bytes()).map_err(|e| {
            ConfigError::Invalid {
                name,
                reason: e.to_string(),
            }
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // 32 bytes of 'k'
    const SECRET: &str = "a2tra2tra2tra2tra2tra2tra2tra2tra2tra2tra2s=";

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_with_only_secret() {
        let config = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", SECRET)])).unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert!(config.database_url.is_none());
        assert!(config.admin.is_none());
        assert_eq!(config.auth.issuer, "todo-backend");
        assert_eq!(config.auth.access_ttl_secs, 3600);
        assert_eq!(config.auth.refresh_ttl_secs, 604_800);
        assert_eq!(config.auth.leeway_secs, 30);
        assert_eq!(config.auth.headers.access.as_str(), "authorization");
        assert_eq!(config.auth.headers.refresh.as_str(), "refresh");
    }

    #[test]
    fn test_missing_secret_fails() {
        let result = AppConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::Missing("JWT_SECRET"))));
    }

    #[test]
    fn test_short_secret_fails() {
        // "short" is 5 bytes
        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "c2hvcnQ=")]));
        assert!(matches!(
            result,
            Err(ConfigError::SecretTooShort {
                actual: 5,
                required: 32
            })
        ));
    }

    #[test]
    fn test_non_base64_secret_fails() {
        let result = AppConfig::from_lookup(lookup_from(&[("JWT_SECRET", "not base64!!")]));
        assert!(matches!(result, Err(ConfigError::InvalidSecret(_))));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_ISSUER", "my-issuer"),
            ("JWT_ACCESS_TTL_SECS", "900"),
            ("JWT_REFRESH_TTL_SECS", "86400"),
            ("JWT_LEEWAY_SECS", "5"),
            ("REFRESH_TOKEN_HEADER", "X-Refresh-Token"),
            ("DATABASE_URL", "postgres://localhost/todo"),
            ("ADMIN_USERNAME", "root"),
            ("ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();

        assert_eq!(config.auth.issuer, "my-issuer");
        assert_eq!(config.auth.access_ttl_secs, 900);
        assert_eq!(config.auth.refresh_ttl_secs, 86400);
        assert_eq!(config.auth.leeway_secs, 5);
        assert_eq!(config.auth.headers.refresh.as_str(), "x-refresh-token");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/todo")
        );
        assert_eq!(config.admin.map(|a| a.username), Some("root".to_string()));
    }

    #[test]
    fn test_invalid_ttl_fails() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_ACCESS_TTL_SECS", "0"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "JWT_ACCESS_TTL_SECS",
                ..
            })
        ));

        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_REFRESH_TTL_SECS", "soon"),
        ]));
        assert!(matches!(result, Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_ttl_upper_bound() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_ACCESS_TTL_SECS", "9223372036854775807"),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "JWT_ACCESS_TTL_SECS",
                ..
            })
        ));

        let max = MAX_TTL_SECS.to_string();
        let too_long = (MAX_TTL_SECS + 1).to_string();
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_REFRESH_TTL_SECS", too_long.as_str()),
        ]));
        assert!(matches!(
            result,
            Err(ConfigError::Invalid {
                name: "JWT_REFRESH_TTL_SECS",
                ..
            })
        ));

        let config = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("JWT_REFRESH_TTL_SECS", max.as_str()),
        ]))
        .unwrap();
        assert_eq!(config.auth.refresh_ttl_secs, MAX_TTL_SECS);
    }

    #[test]
    fn test_half_configured_admin_fails() {
        let result = AppConfig::from_lookup(lookup_from(&[
            ("JWT_SECRET", SECRET),
            ("ADMIN_USERNAME", "root"),
        ]));
        assert!(matches!(result, Err(ConfigError::Missing("ADMIN_PASSWORD"))));
    }
}
