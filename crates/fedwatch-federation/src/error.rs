//! Federation-specific error types.
//!
//! None of these ever reach the scheduler. The resolver absorbs them into a
//! fallback target and the prober turns them into `false`.

use thiserror::Error;

/// Errors that can occur while resolving or probing a remote server.
#[derive(Debug, Error)]
pub enum FederationError {
    // ── Discovery ───────────────────────────────────────────────────────────

    #[error("Failed to resolve server '{0}': {1}")]
    DiscoveryFailed(String, String),

    #[error("Server '{0}' returned a bad well-known response: {1}")]
    BadWellKnown(String, String),

    #[error("SRV lookup for '{0}' failed: {1}")]
    SrvLookup(String, String),

    #[error("Lookup for '{0}' timed out")]
    Timeout(String),

    // ── Remote communication ─────────────────────────────────────────────────

    #[error("HTTP error communicating with remote server '{0}': {1}")]
    RemoteHttp(String, String),

    #[error("Remote server '{0}' returned an unexpected response: {1}")]
    RemoteProtocol(String, String),

    #[error("Remote server '{0}' is not reachable")]
    RemoteUnreachable(String),

    // ── General ─────────────────────────────────────────────────────────────

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

impl From<reqwest::Error> for FederationError {
    fn from(e: reqwest::Error) -> Self {
        let server = e.url().map(|u| u.host_str().unwrap_or("?").to_owned()).unwrap_or_default();
        if e.is_timeout() {
            FederationError::Timeout(server)
        } else if e.is_connect() {
            FederationError::RemoteUnreachable(server)
        } else {
            FederationError::RemoteHttp(server, e.to_string())
        }
    }
}
