//! Federation data types: resolved targets, SRV records, and check results.

use std::fmt;

use serde::{Deserialize, Serialize};

// ─── Resolved target ─────────────────────────────────────────────────────────

/// Which delegation step produced a [`ResolvedTarget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationSource {
    WellKnown,
    Srv,
    Default,
}

impl fmt::Display for DelegationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::WellKnown => "well-known",
            Self::Srv => "srv",
            Self::Default => "default",
        })
    }
}

/// Where to connect for a given server name: `host` or `host:port`.
///
/// Recomputed on every sweep, never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    authority: String,
    source: DelegationSource,
}

impl ResolvedTarget {
    /// Target taken verbatim from a `/.well-known/matrix/server` `m.server` value.
    pub fn well_known(server: impl Into<String>) -> Self {
        Self { authority: server.into(), source: DelegationSource::WellKnown }
    }

    /// Target built from an SRV record, with the trailing root dot removed.
    pub fn from_srv(record: &SrvRecord) -> Self {
        let host = record.target.strip_suffix('.').unwrap_or(&record.target);
        Self {
            authority: format!("{}:{}", host, record.port),
            source: DelegationSource::Srv,
        }
    }

    /// `<domain>:<port>` when no delegation is published.
    pub fn fallback(domain: &str, port: u16) -> Self {
        Self {
            authority: format!("{}:{}", domain, port),
            source: DelegationSource::Default,
        }
    }

    /// The `host[:port]` string.
    pub fn as_str(&self) -> &str {
        &self.authority
    }

    pub fn source(&self) -> DelegationSource {
        self.source
    }
}

impl fmt::Display for ResolvedTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.authority)
    }
}

/// A single `_matrix._tcp` SRV answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SrvRecord {
    /// Target host as returned by DNS, possibly with a trailing `.`.
    pub target: String,
    pub port: u16,
}

// ─── Well-known response ──────────────────────────────────────────────────────

/// Response shape for `/.well-known/matrix/server`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WellKnownServer {
    /// The delegated server, `host[:port]`.
    #[serde(rename = "m.server", default)]
    pub server: String,
}

// ─── Check result ─────────────────────────────────────────────────────────────

/// Outcome of checking one domain during one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckResult {
    Ok,
    /// The resolver itself failed. Carries the reason.
    FailedDelegation(String),
    /// A target was resolved but did not answer the version probe.
    FailedUnreachable,
}

impl CheckResult {
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

impl fmt::Display for CheckResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => f.write_str("OK"),
            Self::FailedDelegation(reason) => write!(f, "Failed (Delegation: {reason})"),
            Self::FailedUnreachable => f.write_str("Failed (Unreachable)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn srv_target_drops_trailing_dot() {
        let record = SrvRecord { target: "matrix.example.org.".into(), port: 443 };
        let target = ResolvedTarget::from_srv(&record);
        assert_eq!(target.as_str(), "matrix.example.org:443");
        assert_eq!(target.source(), DelegationSource::Srv);

        let bare = SrvRecord { target: "fed.example.org".into(), port: 8443 };
        assert_eq!(ResolvedTarget::from_srv(&bare).as_str(), "fed.example.org:8443");
    }

    #[test]
    fn well_known_target_is_verbatim() {
        let target = ResolvedTarget::well_known("delegated.example.org:443");
        assert_eq!(target.to_string(), "delegated.example.org:443");
        assert_eq!(target.source(), DelegationSource::WellKnown);
    }

    #[test]
    fn status_strings() {
        assert_eq!(CheckResult::Ok.to_string(), "OK");
        assert_eq!(CheckResult::FailedUnreachable.to_string(), "Failed (Unreachable)");
        assert_eq!(
            CheckResult::FailedDelegation("boom".into()).to_string(),
            "Failed (Delegation: boom)"
        );
        assert!(CheckResult::Ok.is_ok());
        assert!(!CheckResult::FailedUnreachable.is_ok());
    }
}
