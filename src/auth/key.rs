//! Process-wide HMAC signing key

use base64::{engine::general_purpose::STANDARD, Engine as _};
use jsonwebtoken::{DecodingKey, EncodingKey};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::{JwtProviderError, Result};

/// HMAC secret for HS256 signing and verification.
///
/// The secret bytes are never exposed. `Debug` and logs only ever show a short
/// SHA-256 fingerprint so that two deployments can be compared.
#[derive(Clone)]
pub struct SigningKey {
    encoding: EncodingKey,
    decoding: DecodingKey,
    fingerprint: String,
}

impl SigningKey {
    /// Uses the given bytes directly as the HMAC key
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            fingerprint: fingerprint(secret),
        }
    }

    /// Decodes a standard base64 string and uses the result as the HMAC key
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let secret = STANDARD.decode(encoded.trim()).map_err(|e| {
            JwtProviderError::ConfigError(format!("Signing secret is not valid base64: {}", e))
        })?;
        if secret.is_empty() {
            return Err(JwtProviderError::ConfigError(
                "Signing secret decodes to zero bytes".to_string(),
            ));
        }
        Ok(Self::from_secret(&secret))
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub(crate) fn encoding_key(&self) -> &EncodingKey {
        &self.encoding
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("fingerprint", &self.fingerprint)
            .finish()
    }
}

// First 8 bytes of SHA-256, hex encoded
fn fingerprint(secret: &[u8]) -> String {
    let digest = Sha256::digest(secret);
    digest[..8].iter().map(|b| format!("{:02x}", b)).collect()
}
