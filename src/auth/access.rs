//! Write and admin access decisions.
//!
//! `check_write` and `check_admin` run synchronously in front of every
//! mutating operation and short-circuit before any side effect. Apart
//! from the delegated user/permission lookup they are pure functions of
//! the actor and configuration.

use thiserror::Error;
use tracing::debug;

use crate::config::{AppConfig, AuthConfig, ConfigError, FederationConfig};
use crate::context::RequestContext;
use crate::services::Services;

use super::actor::{SCOPE_INTERNAL_CLI, SCOPE_WORKER_BUILD};

/// Operation-name prefix the worker scope is allowed to write to.
pub const BUILDS_PREFIX: &str = "Builds.";

/// Access denial or failure. The kind matters: `Unauthenticated` and
/// `PermissionDenied` are final decisions, `Internal` means the check
/// itself could not complete.
#[derive(Debug, Error)]
pub enum AccessError {
    /// No authenticated user and no scope grants the operation.
    #[error("write operation ({operation}) denied: no authenticated user in current context")]
    Unauthenticated { operation: String },

    /// The user is authenticated but not an admin.
    #[error("admin operation ({operation}) denied: user {uid} does not have admin status")]
    PermissionDenied { operation: String, uid: u32 },

    /// The user/permission lookup failed; names the operation and actor
    /// for diagnosis.
    #[error("admin operation ({operation}) denied: could not complete permissions check for user {uid}")]
    Internal {
        operation: String,
        uid: u32,
        #[source]
        source: anyhow::Error,
    },

    /// The deployment is misconfigured for the check (e.g. a satellite
    /// without a root endpoint).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// The access decision functions, bound to this node's configuration.
#[derive(Debug, Clone)]
pub struct AccessGate {
    auth: AuthConfig,
    federation: FederationConfig,
}

impl AccessGate {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            auth: config.auth.clone(),
            federation: config.federation.clone(),
        }
    }

    pub fn from_parts(auth: AuthConfig, federation: FederationConfig) -> Self {
        Self { auth, federation }
    }

    /// Check that the context's actor may perform the write operation
    /// named `operation`. Returns `Ok(())` exactly when access is
    /// granted.
    pub async fn check_write(
        &self,
        ctx: &RequestContext,
        operation: &str,
    ) -> Result<(), AccessError> {
        if !self.auth.source.has_user_accounts() {
            // No user accounts on this server; everyone has write access.
            return Ok(());
        }

        let actor = ctx.actor();
        if !actor.is_authenticated() {
            // An anonymous actor may still hold a token scope that grants
            // write. Scope signatures were verified when the actor was
            // constructed from request metadata; they are not re-checked
            // here.
            for scope in &actor.scopes {
                if scope == SCOPE_INTERNAL_CLI {
                    return Ok(());
                }
                if scope == SCOPE_WORKER_BUILD && operation.starts_with(BUILDS_PREFIX) {
                    return Ok(());
                }
            }
            return Err(AccessError::Unauthenticated {
                operation: operation.to_string(),
            });
        }

        if self.auth.restrict_write_access {
            return self.check_admin(ctx, operation).await;
        }

        // All authenticated users have write access in this mode.
        Ok(())
    }

    /// Check that the context's actor has admin access for `operation`.
    pub async fn check_admin(
        &self,
        ctx: &RequestContext,
        operation: &str,
    ) -> Result<(), AccessError> {
        if !self.auth.source.has_user_accounts() {
            return Ok(());
        }

        let actor = ctx.actor();
        let is_admin = if self.auth.source.is_local() {
            // This node is authoritative for user records.
            let user = ctx
                .services()
                .users()
                .get_user(actor.uid)
                .await
                .map_err(|source| AccessError::Internal {
                    operation: operation.to_string(),
                    uid: actor.uid,
                    source,
                })?;
            user.admin
        } else {
            // Satellite: ask the root's permission service. Lookups are
            // not cached; every admin operation pays the round-trip.
            let endpoint = self.federation.root_endpoint()?.to_string();
            debug!(operation, uid = actor.uid, %endpoint, "forwarding admin check to root");
            let root_ctx = ctx
                .with_services(Services::remote(&endpoint))
                .with_endpoint(Some(endpoint));
            let perms = root_ctx
                .services()
                .permissions()
                .get_user_permissions(actor.uid, &actor.client_id)
                .await
                .map_err(|source| AccessError::Internal {
                    operation: operation.to_string(),
                    uid: actor.uid,
                    source,
                })?;
            perms.admin
        };

        if !is_admin {
            return Err(AccessError::PermissionDenied {
                operation: operation.to_string(),
                uid: actor.uid,
            });
        }
        Ok(())
    }
}
