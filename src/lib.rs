//! JWT Provider - bearer token issuance and validation
//!
//! This library issues HS256-signed tokens for authenticated users, extracts
//! them from `Authorization` headers, validates signature and expiry, and
//! resolves valid tokens into an authentication principal.

pub mod auth;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod security_logger;
pub mod storage;

// Re-export main components
pub use auth::{AuthenticationPrincipal, JwtTokenProvider, Role, TokenProvider, User, UserLookup};
pub use config::*;
pub use constants::*;
pub use error::{JwtProviderError, Result, TokenErrorKind};
