//! Repository authority discovery.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::{ConfigError, FederationConfig};
use crate::context::RequestContext;
use crate::services::Services;

/// Discovery failure.
#[derive(Debug, Error)]
pub enum DiscoverError {
    /// No registered resolver recognizes the name. This means "no such
    /// repository provider", not a transient failure.
    #[error("no repository provider recognizes {repo}")]
    NotFound { repo: String },

    /// The node is misconfigured for the resolution (e.g. a satellite
    /// without a root endpoint).
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DiscoverError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DiscoverError::NotFound { .. })
    }
}

/// The provider a resolver matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderInfo {
    /// Provider name, e.g. "GitHub".
    pub provider: String,
    /// Host the provider serves, e.g. "github.com".
    pub host: String,
}

impl ProviderInfo {
    /// Human-readable label, e.g. `GitHub (github.com)`.
    pub fn label(&self) -> String {
        format!("{} ({})", self.provider, self.host)
    }
}

/// Recognizes repository names belonging to one provider.
pub trait RepoResolver: Send + Sync {
    fn resolve(&self, repo: &str) -> Option<ProviderInfo>;
}

/// Resolver matching names under a well-known host prefix, e.g.
/// `github.com/owner/repo`.
pub struct HostPrefixResolver {
    provider: String,
    host: String,
}

impl HostPrefixResolver {
    pub fn new(provider: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            host: host.into(),
        }
    }
}

impl RepoResolver for HostPrefixResolver {
    fn resolve(&self, repo: &str) -> Option<ProviderInfo> {
        let rest = repo.strip_prefix(&self.host)?.strip_prefix('/')?;
        if rest.is_empty() {
            return None;
        }
        Some(ProviderInfo {
            provider: self.provider.clone(),
            host: self.host.clone(),
        })
    }
}

/// Result of discovery for one repository name: who is authoritative and
/// how to reach them.
#[derive(Debug, Clone)]
pub struct Authority {
    label: String,
    is_local: bool,
    endpoint: Option<String>,
}

impl Authority {
    /// Human-readable label naming the matched provider.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Whether this node serves the repository itself.
    pub fn is_local(&self) -> bool {
        self.is_local
    }

    /// The root RPC endpoint, present only when remote.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Derive a request context with the service set and RPC endpoint
    /// matching this authority's locality. The input context is not
    /// mutated.
    pub fn bind(&self, ctx: &RequestContext) -> RequestContext {
        match &self.endpoint {
            None => ctx.with_services(Services::local()).with_endpoint(None),
            Some(endpoint) => ctx
                .with_services(Services::remote(endpoint))
                .with_endpoint(Some(endpoint.clone())),
        }
    }
}

impl fmt::Display for Authority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Resolves repository names through the registered resolver chain.
pub struct Discovery {
    federation: FederationConfig,
    resolvers: Vec<Arc<dyn RepoResolver>>,
}

impl Discovery {
    pub fn new(federation: FederationConfig, resolvers: Vec<Arc<dyn RepoResolver>>) -> Self {
        Self {
            federation,
            resolvers,
        }
    }

    /// Discovery with the stock resolver set.
    pub fn with_default_resolvers(federation: FederationConfig) -> Self {
        Self::new(
            federation,
            vec![Arc::new(HostPrefixResolver::new("GitHub", "github.com"))],
        )
    }

    /// Resolve a repository name to its authority.
    ///
    /// On a root node every recognized name is local by construction; on
    /// a satellite the same names resolve to the configured root.
    pub fn resolve(&self, repo: &str) -> Result<Authority, DiscoverError> {
        let info = self
            .resolvers
            .iter()
            .find_map(|r| r.resolve(repo))
            .ok_or_else(|| DiscoverError::NotFound {
                repo: repo.to_string(),
            })?;

        let authority = if self.federation.is_root {
            Authority {
                label: info.label(),
                is_local: true,
                endpoint: None,
            }
        } else {
            Authority {
                label: info.label(),
                is_local: false,
                endpoint: Some(self.federation.root_endpoint()?.to_string()),
            }
        };
        debug!(repo, authority = %authority, local = authority.is_local, "resolved");
        Ok(authority)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::auth::Actor;
    use crate::services::{ServiceKind, Services};
    use crate::store::InMemoryUserStore;

    use super::*;

    fn root_config() -> FederationConfig {
        FederationConfig {
            is_root: true,
            root_endpoint: None,
        }
    }

    fn satellite_config(endpoint: &str) -> FederationConfig {
        FederationConfig {
            is_root: false,
            root_endpoint: Some(endpoint.to_string()),
        }
    }

    fn mock_ctx() -> RequestContext {
        RequestContext::new(Services::local_with_store(Arc::new(InMemoryUserStore::new())))
    }

    #[test]
    fn root_resolves_locally() {
        let discovery = Discovery::with_default_resolvers(root_config());
        let authority = discovery.resolve("github.com/o/r").expect("resolved");

        assert_eq!(authority.label(), "GitHub (github.com)");
        assert!(authority.is_local());
        assert_eq!(authority.endpoint(), None);

        let ctx = authority.bind(&mock_ctx());
        assert_eq!(ctx.services().kind(), ServiceKind::Local);
        assert_eq!(ctx.endpoint(), None);
    }

    #[test]
    fn satellite_resolves_to_root() {
        let discovery =
            Discovery::with_default_resolvers(satellite_config("demo-mothership:13100"));
        let authority = discovery.resolve("github.com/o/r").expect("resolved");

        assert_eq!(authority.label(), "GitHub (github.com)");
        assert!(!authority.is_local());
        assert_eq!(authority.endpoint(), Some("demo-mothership:13100"));

        let ctx = authority.bind(&mock_ctx());
        assert_eq!(ctx.services().kind(), ServiceKind::Remote);
        assert_eq!(ctx.endpoint(), Some("demo-mothership:13100"));
    }

    #[test]
    fn unrecognized_name_is_not_found() {
        let discovery = Discovery::with_default_resolvers(root_config());
        let err = discovery.resolve("example.com/foo/bar").expect_err("no provider");
        assert!(err.is_not_found());
    }

    #[test]
    fn bare_host_is_not_a_repository() {
        let discovery = Discovery::with_default_resolvers(root_config());
        assert!(discovery.resolve("github.com").is_err());
        assert!(discovery.resolve("github.com/").is_err());
    }

    #[test]
    fn satellite_without_endpoint_is_a_config_error() {
        let discovery = Discovery::with_default_resolvers(FederationConfig {
            is_root: false,
            root_endpoint: None,
        });
        let err = discovery.resolve("github.com/o/r").expect_err("misconfigured");
        assert!(matches!(err, DiscoverError::Config(_)));
    }

    #[test]
    fn bind_does_not_mutate_the_input_context() {
        let discovery =
            Discovery::with_default_resolvers(satellite_config("demo-mothership:13100"));
        let authority = discovery.resolve("github.com/o/r").expect("resolved");

        let original = mock_ctx().with_actor(Actor::authenticated(1, "alice", "client-a"));
        let bound = authority.bind(&original);

        assert_eq!(original.endpoint(), None);
        assert_eq!(original.services().kind(), ServiceKind::Local);
        assert_eq!(bound.endpoint(), Some("demo-mothership:13100"));
        // The actor carries over to the derived context.
        assert_eq!(bound.actor().login, "alice");
    }
}
