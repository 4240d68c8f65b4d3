use std::error::Error;
use std::fmt;

use crate::constants::EXPIRED_OR_INVALID_MESSAGE;

/// Why a token was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenErrorKind {
    /// Malformed, wrong signature, unsupported algorithm or unreadable payload
    Invalid,
    /// Well formed and correctly signed, but past its expiration
    Expired,
    /// Token is fine but its subject no longer resolves to a user
    UserNotFound,
}

impl TokenErrorKind {
    /// Stable label used in logs and security event counters
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenErrorKind::Invalid => "invalid",
            TokenErrorKind::Expired => "expired",
            TokenErrorKind::UserNotFound => "user_not_found",
        }
    }
}

#[derive(Debug)]
pub enum JwtProviderError {
    // Token errors
    TokenError(TokenErrorKind),

    // Input errors
    ValidationError(String),

    // Signing errors
    SigningError(String),

    // Collaborator errors
    LookupError(String),

    // Configuration errors
    ConfigError(String),
}

impl JwtProviderError {
    /// Returns the token error kind, if this is a token error
    pub fn token_kind(&self) -> Option<TokenErrorKind> {
        match self {
            Self::TokenError(kind) => Some(*kind),
            _ => None,
        }
    }

    /// True for the collapsed "expired or invalid" category
    pub fn is_expired_or_invalid(&self) -> bool {
        matches!(
            self,
            Self::TokenError(TokenErrorKind::Invalid) | Self::TokenError(TokenErrorKind::Expired)
        )
    }
}

impl fmt::Display for JwtProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Expired and invalid tokens must be indistinguishable to callers
            Self::TokenError(TokenErrorKind::Invalid) | Self::TokenError(TokenErrorKind::Expired) => {
                write!(f, "{}", EXPIRED_OR_INVALID_MESSAGE)
            }
            Self::TokenError(TokenErrorKind::UserNotFound) => {
                write!(f, "User not found for token subject")
            }
            Self::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            Self::SigningError(msg) => write!(f, "Token signing error: {}", msg),
            Self::LookupError(msg) => write!(f, "User lookup error: {}", msg),
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl Error for JwtProviderError {}

// Any decode failure from the JWT library is an invalid token
impl From<jsonwebtoken::errors::Error> for JwtProviderError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        log::debug!("JWT decode failed: {:?}", err.kind());
        JwtProviderError::TokenError(TokenErrorKind::Invalid)
    }
}

// Generic result type for the JWT provider
pub type Result<T> = std::result::Result<T, JwtProviderError>;
