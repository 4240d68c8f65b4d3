//! Request-side handlers

pub mod auth;

// Re-export the authentication filter
pub use auth::AuthenticationFilter;
