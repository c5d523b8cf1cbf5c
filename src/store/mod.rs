//! User-record storage interface.
//!
//! The control plane only needs a narrow view of the user store: fetch a
//! record by uid and read its admin flag. The backing implementation is an
//! external collaborator; this module defines the trait, the in-memory
//! implementation used by tests and single-node deployments, and a
//! process-wide handle with open-once semantics.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use memory::InMemoryUserStore;

/// A user record, as the access checks need it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Numeric user identifier.
    pub uid: u32,
    /// Login name.
    pub login: String,
    /// Whether the user has admin privileges.
    pub admin: bool,
}

/// Permission record returned by the root's permission service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPermissions {
    /// Numeric user identifier.
    pub uid: u32,
    /// Read access granted.
    pub read: bool,
    /// Write access granted.
    pub write: bool,
    /// Admin access granted.
    pub admin: bool,
}

/// Errors from the user store.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum StoreError {
    /// No user with the given uid.
    #[error("user {uid} not found")]
    NotFound { uid: u32 },

    /// The store itself failed.
    #[error("user store error: {message}")]
    Internal { message: String },
}

/// Read access to user records.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch a user record by uid.
    async fn get(&self, uid: u32) -> Result<User, StoreError>;
}

/// Process-wide user store handle with open-once semantics.
///
/// The store is opened lazily on first access under a single mutex; once
/// opened, the same handle is shared read-only by every caller. Tests
/// construct their own [`UserStoreHandle`] (or pass a store directly) so
/// nothing forces the global instance.
pub struct UserStoreHandle {
    slot: Mutex<Option<Arc<dyn UserStore>>>,
}

impl UserStoreHandle {
    /// Create an empty handle.
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Return the store, opening it with `open` if this is the first call.
    pub fn open_or_get<F>(&self, open: F) -> Arc<dyn UserStore>
    where
        F: FnOnce() -> Arc<dyn UserStore>,
    {
        let mut slot = self.slot.lock();
        match &*slot {
            Some(store) => Arc::clone(store),
            None => {
                let store = open();
                *slot = Some(Arc::clone(&store));
                store
            }
        }
    }
}

impl Default for UserStoreHandle {
    fn default() -> Self {
        Self::new()
    }
}

static USER_STORE: UserStoreHandle = UserStoreHandle::new();

/// The process-wide user store, opened on first use.
pub fn user_store() -> Arc<dyn UserStore> {
    USER_STORE.open_or_get(|| Arc::new(InMemoryUserStore::new()))
}
