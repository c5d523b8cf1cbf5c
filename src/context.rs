//! The request-scoped context.
//!
//! Everything a request-scoped decision needs travels here explicitly:
//! the actor, the service set, and the RPC endpoint currently in effect.
//! Contexts are immutable; the `with_*` builders return derived copies,
//! which is what federation rebinding relies on.

use crate::auth::Actor;
use crate::services::Services;

/// Request-scoped state, constructed once per inbound request.
#[derive(Clone)]
pub struct RequestContext {
    actor: Actor,
    services: Services,
    endpoint: Option<String>,
}

impl RequestContext {
    /// A context for an anonymous request against the given services.
    pub fn new(services: Services) -> Self {
        Self {
            actor: Actor::anonymous(),
            services,
            endpoint: None,
        }
    }

    pub fn actor(&self) -> &Actor {
        &self.actor
    }

    pub fn services(&self) -> &Services {
        &self.services
    }

    /// The RPC endpoint the context is bound to, when remote.
    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Derived context with a different actor.
    pub fn with_actor(&self, actor: Actor) -> Self {
        Self {
            actor,
            ..self.clone()
        }
    }

    /// Derived context with a different service set.
    pub fn with_services(&self, services: Services) -> Self {
        Self {
            services,
            ..self.clone()
        }
    }

    /// Derived context bound to an RPC endpoint (or unbound for local).
    pub fn with_endpoint(&self, endpoint: Option<String>) -> Self {
        Self {
            endpoint,
            ..self.clone()
        }
    }
}
