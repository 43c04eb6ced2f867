use jsonwebtoken::{encode, Header};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{
    clock::Clock,
    config::AuthConfig,
    keys::{SigningKey, ALGORITHM},
    types::{IssuedToken, TokenClaims, TokenPair, TokenType},
};
use crate::shared::AppError;

/// Mints signed, time-bounded access and refresh tokens.
/// Stateless: nothing about an issued token is remembered.
#[derive(Clone)]
pub struct TokenIssuer {
    key: Arc<SigningKey>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    pub fn new(key: Arc<SigningKey>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        Self { key, config, clock }
    }

    /// Creates an access/refresh pair sharing one subject and issue time
    #[instrument(skip(self, roles))]
    pub fn issue(&self, subject: &str, roles: &BTreeSet<String>) -> Result<TokenPair, AppError> {
        let issued_at = self.clock.now().timestamp();

        let access_token = self.mint(
            subject,
            roles,
            TokenType::Access,
            issued_at,
            self.config.access_ttl_secs,
        )?;
        let refresh_token = self.mint(
            subject,
            roles,
            TokenType::Refresh,
            issued_at,
            self.config.refresh_ttl_secs,
        )?;

        debug!(
            subject = %subject,
            access_exp = access_token.claims.exp,
            refresh_exp = refresh_token.claims.exp,
            "Issued token pair"
        );

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    /// Creates a single access token, used when reissuing from a refresh token
    #[instrument(skip(self, roles))]
    pub fn issue_access(
        &self,
        subject: &str,
        roles: &BTreeSet<String>,
    ) -> Result<IssuedToken, AppError> {
        let issued_at = self.clock.now().timestamp();
        let token = self.mint(
            subject,
            roles,
            TokenType::Access,
            issued_at,
            self.config.access_ttl_secs,
        )?;

        debug!(subject = %subject, exp = token.claims.exp, "Issued access token");
        Ok(token)
    }

    /// Signs arbitrary claims with the server key, without checking their shape
    pub fn sign(&self, claims: TokenClaims) -> Result<IssuedToken, AppError> {
        let token = encode(&Header::new(ALGORITHM), &claims, self.key.encoding_key()).map_err(
            |e| {
                debug!(error = %e, "Failed to encode JWT token");
                AppError::JwtError(e.to_string())
            },
        )?;

        Ok(IssuedToken { token, claims })
    }

    fn mint(
        &self,
        subject: &str,
        roles: &BTreeSet<String>,
        token_type: TokenType,
        issued_at: i64,
        ttl_secs: i64,
    ) -> Result<IssuedToken, AppError> {
        // Anything the validator would reject as MissingClaims is refused here
        if subject.trim().is_empty() {
            return Err(AppError::BadRequest(
                "Token subject must not be blank".to_string(),
            ));
        }
        if roles.is_empty() || roles.iter().any(|role| role.trim().is_empty()) {
            return Err(AppError::BadRequest(
                "Token roles must be non-empty and not blank".to_string(),
            ));
        }

        let exp = issued_at.checked_add(ttl_secs).ok_or_else(|| {
            warn!(issued_at, ttl_secs, "Token expiry overflows");
            AppError::Internal
        })?;

        let claims = TokenClaims {
            sub: subject.to_string(),
            iss: self.config.issuer.clone(),
            iat: issued_at,
            exp,
            token_type: Some(token_type),
            roles: roles.iter().cloned().collect(),
            extra: BTreeMap::new(),
        };

        self.sign(claims)
    }
}
