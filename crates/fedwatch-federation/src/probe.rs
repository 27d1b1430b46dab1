//! Reachability probe against `/_matrix/federation/v1/version`.
//!
//! A server counts as alive when it answers within the timeout with a body that
//! parses as a JSON object. Status code and fields are not inspected. No retries
//! happen here; the sweep cadence is the retry.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tracing::debug;

use crate::{error::FederationError, types::ResolvedTarget};

const VERSION_PATH: &str = "/_matrix/federation/v1/version";

/// Anything that can tell whether a resolved target speaks federation.
#[async_trait]
pub trait ReachabilityProbe: Send + Sync {
    async fn probe(&self, target: &ResolvedTarget) -> bool;
}

/// HTTPS prober with a fixed per-request timeout.
pub struct HttpProber {
    http: reqwest::Client,
    scheme: &'static str,
}

impl HttpProber {
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

    /// Probe `target`, keeping the reason on failure.
    pub async fn check(&self, target: &ResolvedTarget) -> Result<(), FederationError> {
        let url = format!("{}://{}{}", self.scheme, target, VERSION_PATH);
        let resp = self.http.get(&url).send().await?;
        let body = resp.bytes().await?;
        serde_json::from_slice::<Map<String, Value>>(&body)
            .map_err(|e| FederationError::RemoteProtocol(target.to_string(), e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ReachabilityProbe for HttpProber {
    async fn probe(&self, target: &ResolvedTarget) -> bool {
        match self.check(target).await {
            Ok(()) => true,
            Err(e) => {
                debug!("Probe of {} failed: {}", target, e);
                false
            }
        }
    }
}
