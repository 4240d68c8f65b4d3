//! In-memory user directory for development and testing
//!
//! Keeps user records in a map behind an async lock. Suitable for development,
//! tests, or wiring the provider up before a real user service exists.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::auth::user::{User, UserLookup};
use crate::error::Result;

/// In-memory user storage keyed by identity
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store pre-populated with the given users
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        let map = users
            .into_iter()
            .map(|user| (user.identity.clone(), user))
            .collect();
        Self {
            users: Arc::new(RwLock::new(map)),
        }
    }

    /// Inserts or replaces a user, returning the previous record
    pub async fn insert(&self, user: User) -> Option<User> {
        self.users.write().await.insert(user.identity.clone(), user)
    }

    pub async fn remove(&self, identity: &str) -> Option<User> {
        self.users.write().await.remove(identity)
    }

    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

#[async_trait]
impl UserLookup for InMemoryUserStore {
    async fn find_by_identity(&self, identity: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(identity).cloned())
    }
}
