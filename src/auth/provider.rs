//! Token provider capability
//!
//! Callers depend on the `TokenProvider` trait rather than on the JWT
//! implementation, so request handling can be exercised against test doubles.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::auth::token::extract_bearer_token;
use crate::auth::user::Role;
use crate::error::Result;

/// Identity and roles resolved from a valid token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthenticationPrincipal {
    pub identity: String,
    pub roles: BTreeSet<Role>,
    /// Always empty: the token itself was the credential
    pub credentials: String,
}

impl AuthenticationPrincipal {
    pub fn new(identity: String, roles: BTreeSet<Role>) -> Self {
        Self {
            identity,
            roles,
            credentials: String::new(),
        }
    }

    /// Authority names such as `ROLE_USER`, in role order
    pub fn authorities(&self) -> Vec<String> {
        self.roles.iter().map(Role::authority).collect()
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

/// Trait for token providers
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Issue a signed token for the identity carrying the given role names
    fn create_token(&self, identity: &str, roles: &[String]) -> Result<String>;

    /// Extract the raw token from an `Authorization` header value
    fn resolve_token(&self, authorization_header: Option<&str>) -> Option<String> {
        authorization_header.and_then(extract_bearer_token)
    }

    /// Check signature and expiry. Never returns `Ok(false)` for a bad token;
    /// every rejection is an error.
    fn validate_token(&self, token: &str) -> Result<bool>;

    /// Subject of the token
    fn get_username(&self, token: &str) -> Result<String>;

    /// Resolve the token into a principal using the user lookup collaborator
    async fn get_authentication(&self, token: &str) -> Result<AuthenticationPrincipal>;

    /// Get the provider name for logging/debugging
    fn provider_name(&self) -> &'static str;
}
