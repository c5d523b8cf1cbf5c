//! Services forwarding to the federation root.
//!
//! Lookups are per-call round-trips; nothing is cached, so permission
//! changes on the root take effect on the next operation.

use async_trait::async_trait;

use crate::rpc::RootClient;
use crate::store::{User, UserPermissions};

use super::{PermissionService, UserService};

pub struct RemoteUserService {
    client: RootClient,
}

impl RemoteUserService {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: RootClient::new(endpoint),
        }
    }
}

#[async_trait]
impl UserService for RemoteUserService {
    async fn get_user(&self, uid: u32) -> anyhow::Result<User> {
        Ok(self.client.get_user(uid).await?)
    }
}

pub struct RemotePermissionService {
    client: RootClient,
}

impl RemotePermissionService {
    pub fn new(endpoint: &str) -> Self {
        Self {
            client: RootClient::new(endpoint),
        }
    }
}

#[async_trait]
impl PermissionService for RemotePermissionService {
    async fn get_user_permissions(
        &self,
        uid: u32,
        client_id: &str,
    ) -> anyhow::Result<UserPermissions> {
        Ok(self.client.get_user_permissions(uid, client_id).await?)
    }
}
