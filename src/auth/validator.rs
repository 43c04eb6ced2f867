use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, Validation};
use serde::{de::DeserializeOwned, Deserialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, instrument};

use super::{
    clock::Clock,
    config::AuthConfig,
    keys::{SigningKey, ALGORITHM},
    types::{Principal, RejectionReason, TokenClaims, TokenType},
};

/// Verifies presented tokens.
///
/// Checks run in a fixed order and the first failure wins: structure,
/// signature (including the header algorithm), issuer, expiry, token type,
/// then presence of subject and roles.
#[derive(Clone)]
pub struct TokenValidator {
    key: Arc<SigningKey>,
    config: Arc<AuthConfig>,
    clock: Arc<dyn Clock>,
    validation: Arc<Validation>,
}

impl TokenValidator {
    pub fn new(key: Arc<SigningKey>, config: Arc<AuthConfig>, clock: Arc<dyn Clock>) -> Self {
        // Only the signature and algorithm are left to jsonwebtoken; issuer and
        // expiry are checked here so they are reported in order.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            key,
            config,
            clock,
            validation: Arc::new(validation),
        }
    }

    /// Validates a token and returns the principal it identifies
    #[instrument(skip(self, token))]
    pub fn validate(
        &self,
        token: &str,
        expected_type: TokenType,
    ) -> Result<Principal, RejectionReason> {
        let claims = self.validate_claims(token, expected_type)?;
        Ok(Principal::new(claims.sub, claims.roles))
    }

    /// Same checks as [`validate`](Self::validate), returning the raw claims
    pub fn validate_claims(
        &self,
        token: &str,
        expected_type: TokenType,
    ) -> Result<TokenClaims, RejectionReason> {
        let claims = self.verify(token)?;
        self.check_expiry(&claims)?;
        check_shape(&claims, expected_type)?;

        debug!(
            subject = %claims.sub,
            token_type = %expected_type,
            exp = claims.exp,
            "Token validated"
        );
        Ok(claims)
    }

    /// Reads the subject of a correctly signed token even when it has expired.
    ///
    /// Only the reissue flow may use this, to compare the subject of a stale
    /// access token with the refresh token's. It never yields a principal.
    #[instrument(skip(self, token))]
    pub fn subject_ignoring_expiry(
        &self,
        token: &str,
        expected_type: TokenType,
    ) -> Result<String, RejectionReason> {
        let claims = self.verify(token)?;
        check_shape(&claims, expected_type)?;
        Ok(claims.sub)
    }

    fn verify(&self, token: &str) -> Result<TokenClaims, RejectionReason> {
        inspect_structure(token)?;

        let data = decode::<TokenClaims>(token, self.key.decoding_key(), &self.validation)
            .map_err(|e| {
                let reason = classify(e.kind());
                debug!(error = %e, reason = %reason, "Failed to decode JWT token");
                reason
            })?;

        if data.claims.iss != self.config.issuer {
            debug!(iss = %data.claims.iss, "Token issuer mismatch");
            return Err(RejectionReason::BadIssuer);
        }

        Ok(data.claims)
    }

    fn check_expiry(&self, claims: &TokenClaims) -> Result<(), RejectionReason> {
        let now = self.clock.now().timestamp();
        if now > claims.exp.saturating_add(self.config.leeway_secs) {
            debug!(now, exp = claims.exp, "Token expired");
            return Err(RejectionReason::Expired);
        }
        Ok(())
    }
}

/// Just enough of the JOSE header to read the algorithm
#[derive(Deserialize)]
struct RawHeader {
    alg: String,
}

/// Structure before signature: three segments, each of header and payload
/// base64url JSON, and only then the header algorithm.
fn inspect_structure(token: &str) -> Result<(), RejectionReason> {
    let segments: Vec<&str> = token.split('.').collect();
    let [header, payload, _signature] = segments.as_slice() else {
        debug!(segments = segments.len(), "Token does not have three segments");
        return Err(RejectionReason::Malformed);
    };

    let header: RawHeader = decode_segment(header)?;
    decode_segment::<TokenClaims>(payload)?;

    match Algorithm::from_str(&header.alg) {
        Ok(alg) if alg == ALGORITHM => Ok(()),
        _ => {
            debug!(alg = %header.alg, "Unsupported token algorithm");
            Err(RejectionReason::BadSignature)
        }
    }
}

fn decode_segment<T: DeserializeOwned>(segment: &str) -> Result<T, RejectionReason> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        debug!(error = %e, "Token segment is not base64url");
        RejectionReason::Malformed
    })?;
    serde_json::from_slice(&bytes).map_err(|e| {
        debug!(error = %e, "Token segment is not the expected JSON");
        RejectionReason::Malformed
    })
}

fn check_shape(claims: &TokenClaims, expected_type: TokenType) -> Result<(), RejectionReason> {
    if claims.token_type != Some(expected_type) {
        return Err(RejectionReason::WrongType);
    }

    // Mirrors what the issuer refuses to sign
    let blank_role = claims.roles.iter().any(|role| role.trim().is_empty());
    if claims.sub.trim().is_empty() || claims.roles.is_empty() || blank_role {
        return Err(RejectionReason::MissingClaims);
    }

    Ok(())
}

fn classify(kind: &ErrorKind) -> RejectionReason {
    match kind {
        ErrorKind::InvalidSignature
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName
        | ErrorKind::InvalidKeyFormat => RejectionReason::BadSignature,
        _ => RejectionReason::Malformed,
    }
}
