//! The request-scoped service set.
//!
//! Operations that need user or permission data reach it through the
//! service set carried in the request context. Three constructions exist:
//! local (backed by this node's user store), remote (RPC client bound to
//! the federation root), and mock (tests). Which one a context carries is
//! decided explicitly — at node startup for the default, and by
//! federation discovery when an authority rebinding swaps it.

mod local;
mod mock;
mod remote;

use std::sync::Arc;

use async_trait::async_trait;

use crate::store::{User, UserPermissions, UserStore};

pub use local::{LocalPermissionService, LocalUserService};
pub use mock::{MockPermissionService, MockUserService};
pub use remote::{RemotePermissionService, RemoteUserService};

/// User-record lookups.
#[async_trait]
pub trait UserService: Send + Sync {
    async fn get_user(&self, uid: u32) -> anyhow::Result<User>;
}

/// Permission-record lookups.
#[async_trait]
pub trait PermissionService: Send + Sync {
    async fn get_user_permissions(&self, uid: u32, client_id: &str)
        -> anyhow::Result<UserPermissions>;
}

/// Which construction a service set came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceKind {
    Local,
    Remote,
    Mock,
}

/// One request's view of the services, selected at construction time.
#[derive(Clone)]
pub struct Services {
    kind: ServiceKind,
    users: Arc<dyn UserService>,
    permissions: Arc<dyn PermissionService>,
}

impl Services {
    /// Services backed by the process-wide user store.
    pub fn local() -> Self {
        Self::local_with_store(crate::store::user_store())
    }

    /// Services backed by an explicit user store (tests, embedded use).
    pub fn local_with_store(store: Arc<dyn UserStore>) -> Self {
        Self {
            kind: ServiceKind::Local,
            users: Arc::new(LocalUserService::new(Arc::clone(&store))),
            permissions: Arc::new(LocalPermissionService::new(store)),
        }
    }

    /// Services forwarding to the federation root at `endpoint`.
    pub fn remote(endpoint: &str) -> Self {
        Self {
            kind: ServiceKind::Remote,
            users: Arc::new(RemoteUserService::new(endpoint)),
            permissions: Arc::new(RemotePermissionService::new(endpoint)),
        }
    }

    /// Mock services for tests.
    pub fn mock(users: Arc<MockUserService>, permissions: Arc<MockPermissionService>) -> Self {
        Self {
            kind: ServiceKind::Mock,
            users,
            permissions,
        }
    }

    pub fn kind(&self) -> ServiceKind {
        self.kind
    }

    pub fn users(&self) -> &dyn UserService {
        &*self.users
    }

    pub fn permissions(&self) -> &dyn PermissionService {
        &*self.permissions
    }
}
