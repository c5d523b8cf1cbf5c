//! The authenticated (or anonymous) identity behind a request.

use serde::{Deserialize, Serialize};

/// Token scope granting unconditional write access. Set for client
/// commands spawned inside the server process itself.
pub const SCOPE_INTERNAL_CLI: &str = "internal:cli";

/// Token scope granting write access to build operations only.
pub const SCOPE_WORKER_BUILD: &str = "worker:build";

/// The identity a request acts as.
///
/// Constructed once from request metadata by the upstream auth layer,
/// immutable afterwards, and carried via the request context — never
/// stored. An unauthenticated actor may still hold token scopes (e.g. the
/// internal CLI scope) that grant it specific access.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Numeric user identifier; 0 when anonymous.
    pub uid: u32,
    /// Login name; empty when anonymous.
    pub login: String,
    /// Identifier of the registered API client the request came through.
    pub client_id: String,
    /// Token scopes attached to the request's access token.
    pub scopes: Vec<String>,
    /// Whether the actor carries an authenticated user identity.
    pub authenticated: bool,
}

impl Actor {
    /// An anonymous actor with no scopes.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An anonymous actor carrying token scopes.
    pub fn with_scopes<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            scopes: scopes.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// An authenticated actor.
    pub fn authenticated(uid: u32, login: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            uid,
            login: login.into(),
            client_id: client_id.into(),
            scopes: Vec::new(),
            authenticated: true,
        }
    }

    /// Whether the actor carries an authenticated user identity.
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    /// Whether the actor's token carries the given scope.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
