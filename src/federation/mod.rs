//! Federation: who is authoritative for a repository name.
//!
//! A root node serves recognized repositories locally; a satellite
//! recognizes the same names but routes authority-sensitive operations to
//! its configured root. Discovery resolves a name to an [`Authority`]
//! which, bound to a request context, installs the matching service set
//! and RPC endpoint.

mod discover;

pub use discover::{
    Authority, DiscoverError, Discovery, HostPrefixResolver, ProviderInfo, RepoResolver,
};
