//! Token issuance, validation and principal resolution

pub mod key;
pub mod provider;
pub mod token;
pub mod user;

// Re-export main components
pub use key::SigningKey;
pub use provider::{AuthenticationPrincipal, TokenProvider};
pub use token::{extract_bearer_token, Claims, JwtTokenProvider};
pub use user::{Role, User, UserLookup};
