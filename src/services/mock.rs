//! Mock services for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::store::{User, UserPermissions};

use super::{PermissionService, UserService};

/// A user service answering from a fixed map.
#[derive(Default)]
pub struct MockUserService {
    users: RwLock<HashMap<u32, User>>,
    calls: AtomicUsize,
}

impl MockUserService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, user: User) {
        self.users.write().await.insert(user.uid, user);
    }

    /// How many lookups have been made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl UserService for MockUserService {
    async fn get_user(&self, uid: u32) -> anyhow::Result<User> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.users
            .read()
            .await
            .get(&uid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("user {uid} not found"))
    }
}

/// A permission service answering a fixed admin flag.
pub struct MockPermissionService {
    admin: bool,
    calls: AtomicUsize,
}

impl MockPermissionService {
    pub fn new(admin: bool) -> Self {
        Self {
            admin,
            calls: AtomicUsize::new(0),
        }
    }

    /// How many permission lookups have been made.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl PermissionService for MockPermissionService {
    async fn get_user_permissions(
        &self,
        uid: u32,
        _client_id: &str,
    ) -> anyhow::Result<UserPermissions> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(UserPermissions {
            uid,
            read: true,
            write: true,
            admin: self.admin,
        })
    }
}
