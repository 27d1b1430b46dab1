//! # fedwatch-federation
//!
//! Server-side half of the Matrix federation checks.
//!
//! ## Key concepts
//!
//! - **Discovery** (`discovery.rs`): resolves a bare server name to the
//!   `host[:port]` other servers actually connect to. Order is
//!   `/.well-known/matrix/server`, then the `_matrix._tcp` SRV record, then
//!   `<name>:8448`. Resolution never fails.
//! - **Probe** (`probe.rs`): `GET /_matrix/federation/v1/version` against a
//!   resolved target with a hard timeout. Any JSON object body counts as alive.
//! - **Types** (`types.rs`): resolved targets, SRV records and per-domain
//!   check results.

pub mod discovery;
pub mod error;
pub mod probe;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use discovery::{DelegationResolver, ServerResolver};
pub use error::FederationError;
pub use probe::{HttpProber, ReachabilityProbe};
pub use types::{CheckResult, DelegationSource, ResolvedTarget, SrvRecord};
