//! Actor identity and access-control decisions.
//!
//! An [`Actor`] is constructed once per inbound request from request
//! metadata and carried immutably in the request context. The
//! [`AccessGate`] makes the write/admin decisions every mutating operation
//! is gated on; admin checks on satellite nodes are forwarded to the
//! federation root's permission service.

mod access;
mod actor;


pub use access::{AccessError, AccessGate};
pub use actor::{Actor, SCOPE_INTERNAL_CLI, SCOPE_WORKER_BUILD};
