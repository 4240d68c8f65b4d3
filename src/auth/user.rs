use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::constants::ROLE_AUTHORITY_PREFIX;
use crate::error::{JwtProviderError, Result};

/// Application roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    /// Name as it appears in the token `roles` claim
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "USER",
            Role::Admin => "ADMIN",
        }
    }

    /// Authority string, e.g. `ROLE_ADMIN`
    pub fn authority(&self) -> String {
        format!("{}{}", ROLE_AUTHORITY_PREFIX, self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = JwtProviderError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "USER" => Ok(Role::User),
            "ADMIN" => Ok(Role::Admin),
            other => Err(JwtProviderError::ValidationError(format!(
                "Unknown role: {}",
                other
            ))),
        }
    }
}

/// User record as returned by the user lookup collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Identity, typically an email address
    pub identity: String,
    /// Stored password hash; never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Current role assignments
    pub roles: HashSet<Role>,
}

impl User {
    pub fn new(identity: String, password_hash: String) -> Self {
        Self {
            identity,
            password_hash,
            roles: HashSet::new(),
        }
    }

    pub fn with_roles(identity: String, password_hash: String, roles: &[Role]) -> Self {
        let mut user = Self::new(identity, password_hash);
        user.roles.extend(roles.iter().copied());
        user
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Role names in the form used by the token `roles` claim, sorted
    pub fn role_names(&self) -> Vec<String> {
        let mut roles: Vec<Role> = self.roles.iter().copied().collect();
        roles.sort();
        roles.iter().map(|r| r.as_str().to_string()).collect()
    }
}

/// Read-only access to user records
#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Find a user by identity; `Ok(None)` when no such user exists
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_names_round_trip_through_from_str() {
        assert_eq!("USER".parse::<Role>().unwrap(), Role::User);
        assert_eq!("ADMIN".parse::<Role>().unwrap(), Role::Admin);
        assert!("admin".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_role_serializes_uppercase() {
        let json = serde_json::to_string(&vec![Role::User, Role::Admin]).unwrap();
        assert_eq!(json, r#"["USER","ADMIN"]"#);
    }

    #[test]
    fn test_role_authority() {
        assert_eq!(Role::User.authority(), "ROLE_USER");
        assert_eq!(Role::Admin.authority(), "ROLE_ADMIN");
    }

    #[test]
    fn test_user_role_names_sorted() {
        let user = User::with_roles(
            "aboba@example.com".to_string(),
            "hash".to_string(),
            &[Role::Admin, Role::User],
        );
        assert_eq!(user.role_names(), vec!["USER".to_string(), "ADMIN".to_string()]);
        assert!(user.has_role(Role::Admin));
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::new("aboba@example.com".to_string(), "super-hash".to_string());
        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("super-hash"));
    }
}
