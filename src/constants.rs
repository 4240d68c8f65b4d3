// Request header carrying the bearer credential
pub const AUTHORIZATION_HEADER: &str = "Authorization";
pub const BEARER_PREFIX: &str = "Bearer ";

// Fixed message for both expired and invalid tokens
pub const EXPIRED_OR_INVALID_MESSAGE: &str = "Expired or invalid JWT token";

// Token policy defaults
pub const DEFAULT_EXPIRE_LENGTH_MS: u64 = 3_600_000;
pub const MIN_EXPIRE_LENGTH_MS: u64 = 1_000;
pub const DEFAULT_MAX_TOKEN_LENGTH: usize = 4096;

// Secret requirements
pub const MIN_SECRET_LENGTH: usize = 32;
pub const GENERATED_SECRET_BYTES: usize = 32;

// Prefix for authority names derived from roles
pub const ROLE_AUTHORITY_PREFIX: &str = "ROLE_";
