//! Services backed by this node's user store.

use std::sync::Arc;

use async_trait::async_trait;

use crate::store::{User, UserPermissions, UserStore};

use super::{PermissionService, UserService};

pub struct LocalUserService {
    store: Arc<dyn UserStore>,
}

impl LocalUserService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UserService for LocalUserService {
    async fn get_user(&self, uid: u32) -> anyhow::Result<User> {
        Ok(self.store.get(uid).await?)
    }
}

pub struct LocalPermissionService {
    store: Arc<dyn UserStore>,
}

impl LocalPermissionService {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PermissionService for LocalPermissionService {
    async fn get_user_permissions(
        &self,
        uid: u32,
        _client_id: &str,
    ) -> anyhow::Result<UserPermissions> {
        // Locally, permissions are derived from the user record.
        let user = self.store.get(uid).await?;
        Ok(UserPermissions {
            uid,
            read: true,
            write: true,
            admin: user.admin,
        })
    }
}
