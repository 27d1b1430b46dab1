//! Server discovery: resolves a bare server name to the endpoint other
//! homeservers connect to.
//!
//! Resolution order, first success wins:
//!
//! 1. **`.well-known/matrix/server`**: GET `https://<name>/.well-known/matrix/server`.
//!    A non-empty `m.server` string is used as-is, port included.
//! 2. **SRV**: `_matrix._tcp.<name>`. The first record in answer order becomes
//!    `<target>:<port>`.
//! 3. **Default**: `<name>:8448`.
//!
//! Nothing is cached. Every sweep resolves every domain again.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::TokioResolver;
use tracing::{debug, warn};

use crate::{
    error::FederationError,
    types::{ResolvedTarget, SrvRecord, WellKnownServer},
};

/// Default federation port.
pub const DEFAULT_FED_PORT: u16 = 8448;

// ─── Seams ───────────────────────────────────────────────────────────────────

/// Source of `/.well-known/matrix/server` delegations.
#[async_trait]
pub trait WellKnownLookup: Send + Sync {
    /// `Ok(None)` when the document exists but names no server.
    async fn lookup(&self, domain: &str) -> Result<Option<String>, FederationError>;
}

/// Source of `_matrix._tcp` SRV records.
#[async_trait]
pub trait SrvLookup: Send + Sync {
    /// Records in the order the DNS server returned them.
    async fn lookup(&self, domain: &str) -> Result<Vec<SrvRecord>, FederationError>;
}

/// Anything that turns a server name into a connectable target.
#[async_trait]
pub trait ServerResolver: Send + Sync {
    async fn resolve(&self, domain: &str) -> Result<ResolvedTarget, FederationError>;
}

// ─── Resolver ────────────────────────────────────────────────────────────────

/// Three-step delegation resolver. Always produces a target.
#[derive(Clone)]
pub struct DelegationResolver {
    well_known: Arc<dyn WellKnownLookup>,
    srv: Arc<dyn SrvLookup>,
}

impl DelegationResolver {
    pub fn new(well_known: Arc<dyn WellKnownLookup>, srv: Arc<dyn SrvLookup>) -> Self {
        Self { well_known, srv }
    }

    /// Resolver backed by HTTPS well-known lookups and the system DNS resolver,
    /// each bounded by `lookup_timeout`.
    pub fn from_network(lookup_timeout: Duration) -> Result<Self, FederationError> {
        Ok(Self::new(
            Arc::new(HttpWellKnown::new(lookup_timeout)?),
            Arc::new(DnsSrv::new(lookup_timeout)),
        ))
    }
}

#[async_trait]
impl ServerResolver for DelegationResolver {
    async fn resolve(&self, domain: &str) -> Result<ResolvedTarget, FederationError> {
        match self.well_known.lookup(domain).await {
            Ok(Some(server)) => {
                debug!("Discovery (well-known): {} → {}", domain, server);
                return Ok(ResolvedTarget::well_known(server));
            }
            Ok(None) => debug!("Discovery: {} publishes an empty m.server", domain),
            Err(e) => debug!("Discovery: no well-known for {}: {}", domain, e),
        }

        match self.srv.lookup(domain).await {
            Ok(records) => {
                if let Some(first) = records.first() {
                    let target = ResolvedTarget::from_srv(first);
                    debug!("Discovery (srv): {} → {}", domain, target);
                    return Ok(target);
                }
                debug!("Discovery: SRV answer for {} is empty", domain);
            }
            Err(e) => debug!("Discovery: no SRV for {}: {}", domain, e),
        }

        let target = ResolvedTarget::fallback(domain, DEFAULT_FED_PORT);
        debug!("Discovery (fallback): {} → {}", domain, target);
        Ok(target)
    }
}

// ─── Well-known over HTTPS ───────────────────────────────────────────────────

/// Fetches `/.well-known/matrix/server` with a bounded timeout.
pub struct HttpWellKnown {
    http: reqwest::Client,
    scheme: &'static str,
}

impl HttpWellKnown {
    pub fn new(timeout: Duration) -> Result<Self, FederationError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fedwatch/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FederationError::HttpClient(e.to_string()))?;
        Ok(Self { http, scheme: "https" })
    }

    #[cfg(test)]
    fn plain_http(mut self) -> Self {
        self.scheme = "http";
        self
    }
}

#[async_trait]
impl WellKnownLookup for HttpWellKnown {
    async fn lookup(&self, domain: &str) -> Result<Option<String>, FederationError> {
        let url = format!("{}://{}/.well-known/matrix/server", self.scheme, domain);
        let resp = self.http.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(FederationError::BadWellKnown(
                domain.to_owned(),
                format!("status {}", resp.status()),
            ));
        }
        let wk: WellKnownServer = resp
            .json()
            .await
            .map_err(|e| FederationError::BadWellKnown(domain.to_owned(), e.to_string()))?;
        Ok((!wk.server.is_empty()).then_some(wk.server))
    }
}

// ─── SRV over DNS ────────────────────────────────────────────────────────────

/// Queries `_matrix._tcp.<domain>` through the system resolver.
pub struct DnsSrv {
    resolver: TokioResolver,
    timeout: Duration,
}

impl DnsSrv {
    pub fn new(timeout: Duration) -> Self {
        let builder = match TokioResolver::builder_tokio() {
            Ok(builder) => builder,
            Err(e) => {
                warn!("System DNS configuration unavailable ({}), using defaults", e);
                TokioResolver::builder_with_config(
                    ResolverConfig::default(),
                    TokioConnectionProvider::default(),
                )
            }
        };

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;

        Self { resolver: builder.with_options(opts).build(), timeout }
    }
}

#[async_trait]
impl SrvLookup for DnsSrv {
    async fn lookup(&self, domain: &str) -> Result<Vec<SrvRecord>, FederationError> {
        let name = format!("_matrix._tcp.{}", domain);
        let answer = tokio::time::timeout(self.timeout, self.resolver.srv_lookup(name.as_str()))
            .await
            .map_err(|_| FederationError::Timeout(name.clone()))?
            .map_err(|e| FederationError::SrvLookup(domain.to_owned(), e.to_string()))?;

        Ok(answer
            .iter()
            .map(|srv| SrvRecord { target: srv.target().to_utf8(), port: srv.port() })
            .collect())
    }
}
