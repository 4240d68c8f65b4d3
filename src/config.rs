//! Token provider configuration module
//! Handles the signing secret and token lifetime policy

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::auth::key::SigningKey;
use crate::constants::{
    DEFAULT_EXPIRE_LENGTH_MS, DEFAULT_MAX_TOKEN_LENGTH, GENERATED_SECRET_BYTES,
    MIN_EXPIRE_LENGTH_MS, MIN_SECRET_LENGTH,
};
use crate::error::{JwtProviderError, Result};
use crate::security_logger::{log_security_event, SecurityEvent};

/// How the configured secret string becomes key bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretEncoding {
    /// UTF-8 bytes of the string are the key
    Raw,
    /// The string is standard base64 of the key
    Base64,
}

impl FromStr for SecretEncoding {
    type Err = JwtProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "raw" => Ok(SecretEncoding::Raw),
            "base64" => Ok(SecretEncoding::Base64),
            other => Err(JwtProviderError::ConfigError(format!(
                "Unknown secret encoding '{}', expected 'raw' or 'base64'",
                other
            ))),
        }
    }
}

/// Where the principal's roles come from during authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RoleSource {
    /// Roles are read fresh from the user record
    #[default]
    UserRecord,
    /// Roles are taken from the token's `roles` claim
    Token,
}

impl FromStr for RoleSource {
    type Err = JwtProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "user" | "user_record" => Ok(RoleSource::UserRecord),
            "token" => Ok(RoleSource::Token),
            other => Err(JwtProviderError::ConfigError(format!(
                "Unknown role source '{}', expected 'user' or 'token'",
                other
            ))),
        }
    }
}

/// Token provider configuration parameters
#[derive(Clone)]
pub struct TokenConfig {
    /// Signing secret as supplied by the environment
    pub secret: String,
    pub secret_encoding: SecretEncoding,
    /// How long an issued token stays valid
    pub validity: Duration,
    pub role_source: RoleSource,
    /// Tokens longer than this are rejected before any parsing
    pub max_token_length: usize,
}

impl fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("secret_encoding", &self.secret_encoding)
            .field("validity", &self.validity)
            .field("role_source", &self.role_source)
            .field("max_token_length", &self.max_token_length)
            .finish()
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        panic!("TokenConfig::default() is not allowed for security reasons. Use TokenConfig::from_env() instead.");
    }
}

impl TokenConfig {
    /// Create a test configuration - DANGEROUS: Only for testing!
    #[cfg(test)]
    pub fn for_testing() -> Self {
        Self {
            secret: "unit-test-jwt-key-only-never-use-in-production-0123".to_string(),
            secret_encoding: SecretEncoding::Raw,
            validity: Duration::from_millis(DEFAULT_EXPIRE_LENGTH_MS),
            role_source: RoleSource::UserRecord,
            max_token_length: DEFAULT_MAX_TOKEN_LENGTH,
        }
    }

    /// Validate that a secret meets security requirements
    fn validate_secret(secret: &str) -> Result<()> {
        if secret.len() < MIN_SECRET_LENGTH {
            return Err(JwtProviderError::ConfigError(format!(
                "JWT secret must be at least {} characters long",
                MIN_SECRET_LENGTH
            )));
        }

        // Check for insecure default or example values
        let insecure_patterns = [
            "your-secret-key",
            "change-this",
            "test-secret",
            "default",
            "secret",
            "password",
            "12345",
        ];

        for pattern in &insecure_patterns {
            if secret.to_lowercase().contains(pattern) {
                return Err(JwtProviderError::ConfigError(format!(
                    "JWT secret contains insecure pattern '{}'. Please use a secure random secret generated with: jwt_tool generate-secret",
                    pattern
                )));
            }
        }

        if secret.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(JwtProviderError::ConfigError(
                "JWT secret should contain mixed characters (letters, numbers, symbols) for security".to_string(),
            ));
        }

        Ok(())
    }

    fn validate_validity(validity: Duration) -> Result<()> {
        if validity < Duration::from_millis(MIN_EXPIRE_LENGTH_MS) {
            return Err(JwtProviderError::ConfigError(format!(
                "Token validity must be at least {} ms",
                MIN_EXPIRE_LENGTH_MS
            )));
        }

        // Every issued token must get a representable expiry
        let representable = chrono::Duration::from_std(validity)
            .ok()
            .and_then(|delta| chrono::Utc::now().checked_add_signed(delta))
            .is_some();
        if !representable {
            return Err(JwtProviderError::ConfigError(format!(
                "Token validity of {} ms is too large",
                validity.as_millis()
            )));
        }

        Ok(())
    }

    /// Parse an optional numeric variable, falling back to `default` when unset
    fn numeric_var<T: FromStr>(name: &str, default: T) -> Result<T> {
        match env::var(name) {
            Ok(value) => value.trim().parse().map_err(|_| {
                JwtProviderError::ConfigError(format!(
                    "{} must be a non-negative integer, got '{}'",
                    name, value
                ))
            }),
            Err(_) => Ok(default),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_PROVIDER_SECRET")
            .or_else(|_| env::var("JWT_SECRET"))
            .map_err(|_| {
                JwtProviderError::ConfigError(
                    "JWT_SECRET environment variable is required for security. \
                     Generate one with: jwt_tool generate-secret"
                        .to_string(),
                )
            })?;

        let secret_encoding = match env::var("JWT_PROVIDER_SECRET_ENCODING") {
            Ok(value) => value.parse()?,
            Err(_) => SecretEncoding::Raw,
        };

        let expire_length_ms: u64 =
            Self::numeric_var("JWT_PROVIDER_EXPIRE_LENGTH_MS", DEFAULT_EXPIRE_LENGTH_MS)?;

        let role_source = match env::var("JWT_PROVIDER_ROLE_SOURCE") {
            Ok(value) => value.parse()?,
            Err(_) => RoleSource::UserRecord,
        };

        let max_token_length: usize =
            Self::numeric_var("JWT_PROVIDER_MAX_TOKEN_LENGTH", DEFAULT_MAX_TOKEN_LENGTH)?;

        Self::validate_secret(&secret)?;
        let validity = Duration::from_millis(expire_length_ms);
        Self::validate_validity(validity)?;

        let config = Self {
            secret,
            secret_encoding,
            validity,
            role_source,
            max_token_length,
        };

        // Fail at startup rather than on the first request
        config.signing_key()?;

        Ok(config)
    }

    /// Load configuration at startup, reporting failures to the security log
    pub async fn load() -> Result<Self> {
        match Self::from_env() {
            Ok(config) => Ok(config),
            Err(e) => {
                log::error!("Token configuration rejected: {}", e);
                log_security_event(SecurityEvent::ConfigurationError {
                    component: "TokenConfig".to_string(),
                    error: e.to_string(),
                })
                .await;
                Err(e)
            }
        }
    }

    /// Derive the signing key from the configured secret
    pub fn signing_key(&self) -> Result<SigningKey> {
        match self.secret_encoding {
            SecretEncoding::Raw => Ok(SigningKey::from_secret(self.secret.as_bytes())),
            SecretEncoding::Base64 => SigningKey::from_base64(&self.secret),
        }
    }
}

/// Generate a random secret suitable for `JWT_SECRET`, base64 encoded
pub fn generate_secret() -> String {
    let mut bytes = [0u8; GENERATED_SECRET_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
