//! Root-node RPC: user and permission lookups for satellites.
//!
//! Satellites forward admin checks here. The protocol is two lookups;
//! errors travel in-band as [`RpcErrorKind`] so callers keep the
//! not-found/internal distinction across the wire.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;

use crate::store::{StoreError, User, UserPermissions, UserStore};

use super::client::FrameClient;
use super::frame::FrameError;
use super::server;

/// A request to the root's permission service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootRequest {
    /// Fetch a user record.
    GetUser { uid: u32 },
    /// Fetch the permission record for a user acting through a registered
    /// client.
    GetUserPermissions { uid: u32, client_id: String },
}

/// Root responses, with in-band errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RootResponse {
    User(User),
    Permissions(UserPermissions),
    Error(RpcErrorKind),
}

/// Structured error crossing the root RPC boundary.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcErrorKind {
    #[error("{what} not found")]
    NotFound { what: String },

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl From<StoreError> for RpcErrorKind {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { uid } => RpcErrorKind::NotFound {
                what: format!("user {uid}"),
            },
            StoreError::Internal { message } => RpcErrorKind::Internal { message },
        }
    }
}

/// Failure of a call to the root.
#[derive(Debug, Error)]
pub enum RootError {
    /// The transport failed; retry may be safe.
    #[error("root rpc transport failed: {0}")]
    Transport(#[from] FrameError),

    /// The root answered with an application error.
    #[error(transparent)]
    Remote(RpcErrorKind),

    /// The root answered with a response that does not match the request.
    #[error("unexpected response from root")]
    UnexpectedResponse,
}

/// Client for the root's permission service.
#[derive(Debug, Clone)]
pub struct RootClient {
    client: FrameClient,
}

impl RootClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: FrameClient::new(endpoint),
        }
    }

    pub async fn get_user(&self, uid: u32) -> Result<User, RootError> {
        match self.client.call(&RootRequest::GetUser { uid }).await? {
            RootResponse::User(user) => Ok(user),
            RootResponse::Error(kind) => Err(RootError::Remote(kind)),
            _ => Err(RootError::UnexpectedResponse),
        }
    }

    pub async fn get_user_permissions(
        &self,
        uid: u32,
        client_id: &str,
    ) -> Result<UserPermissions, RootError> {
        let request = RootRequest::GetUserPermissions {
            uid,
            client_id: client_id.to_string(),
        };
        match self.client.call(&request).await? {
            RootResponse::Permissions(perms) => Ok(perms),
            RootResponse::Error(kind) => Err(RootError::Remote(kind)),
            _ => Err(RootError::UnexpectedResponse),
        }
    }
}

/// Serve the root permission service over the given listener, answering
/// lookups from the user store.
pub async fn serve_root(
    listener: TcpListener,
    store: Arc<dyn UserStore>,
) -> std::io::Result<()> {
    server::serve(listener, move |request: RootRequest| {
        let store = Arc::clone(&store);
        async move { handle(&*store, request).await }
    })
    .await
}

async fn handle(store: &dyn UserStore, request: RootRequest) -> RootResponse {
    match request {
        RootRequest::GetUser { uid } => match store.get(uid).await {
            Ok(user) => RootResponse::User(user),
            Err(err) => RootResponse::Error(err.into()),
        },
        RootRequest::GetUserPermissions { uid, .. } => match store.get(uid).await {
            // Permissions are derived from the user record: every known
            // user may read and write; admin follows the record.
            Ok(user) => RootResponse::Permissions(UserPermissions {
                uid,
                read: true,
                write: true,
                admin: user.admin,
            }),
            Err(err) => RootResponse::Error(err.into()),
        },
    }
}

#[cfg(test)]
mod tests {
    use crate::store::InMemoryUserStore;

    use super::*;

    #[tokio::test]
    async fn round_trip_over_tcp() {
        let store = Arc::new(InMemoryUserStore::new());
        store
            .insert(User {
                uid: 1,
                login: "root".to_string(),
                admin: true,
            })
            .await;

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(serve_root(listener, store));

        let client = RootClient::new(addr.to_string());
        let perms = client.get_user_permissions(1, "client-a").await.expect("perms");
        assert!(perms.admin);

        let err = client.get_user(99).await.expect_err("unknown user");
        assert!(matches!(
            err,
            RootError::Remote(RpcErrorKind::NotFound { .. })
        ));
    }
}
