//! Signing key and the constants shared by the issuer and validator.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey};

use crate::config::ConfigError;

/// The only algorithm tokens are signed with or accepted under
pub const ALGORITHM: Algorithm = Algorithm::HS256;

/// 256 bits
pub const MIN_KEY_BYTES: usize = 32;

pub const DEFAULT_ISSUER: &str = "todo-backend";

/// Server-held symmetric key, loaded once at startup and never mutated
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKey {
    /// Decodes a standard base64 secret
    pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidSecret(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        if bytes.len() < MIN_KEY_BYTES {
            return Err(ConfigError::SecretTooShort {
                actual: bytes.len(),
                required: MIN_KEY_BYTES,
            });
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        })
    }

    pub fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("algorithm", &ALGORITHM)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_32_byte_key() {
        assert!(SigningKey::from_bytes(&[7u8; 32]).is_ok());
        assert!(SigningKey::from_bytes(&[7u8; 64]).is_ok());
    }

    #[test]
    fn test_rejects_31_byte_key() {
        let result = SigningKey::from_bytes(&[7u8; 31]);
        assert!(matches!(
            result,
            Err(ConfigError::SecretTooShort {
                actual: 31,
                required: MIN_KEY_BYTES
            })
        ));
    }

    #[test]
    fn test_from_base64_trims_whitespace() {
        let encoded = format!("  {}\n", STANDARD.encode([1u8; 48]));
        assert!(SigningKey::from_base64(&encoded).is_ok());
    }

    #[test]
    fn test_debug_hides_key_material() {
        let key = SigningKey::from_bytes(&[42u8; 32]).unwrap();
        let rendered = format!("{:?}", key);
        assert!(rendered.contains("HS256"));
        assert!(!rendered.contains("42"));
    }
}
