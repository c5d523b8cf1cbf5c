//! In-memory user store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{StoreError, User, UserStore};

/// A user store backed by a map, for tests and single-node deployments.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: RwLock<HashMap<u32, User>>,
}

impl InMemoryUserStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user record.
    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.uid, user);
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn get(&self, uid: u32) -> Result<User, StoreError> {
        self.users
            .read()
            .await
            .get(&uid)
            .cloned()
            .ok_or(StoreError::NotFound { uid })
    }
}
