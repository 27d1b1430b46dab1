//! In-memory stand-ins for the homeserver, resolver and prober.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fedwatch_common::config::{
    AppConfig, MatrixConfig, MonitorConfig, RetryConfig, RetryStrategy,
};
use fedwatch_federation::{
    discovery::DEFAULT_FED_PORT, FederationError, ReachabilityProbe, ResolvedTarget, ServerResolver,
};
use fedwatch_matrix::{Homeserver, MatrixError, RoomMetadata};

use crate::sweep::RoomSweeper;

pub fn test_config(log_room: &str, interval_secs: u64) -> Arc<AppConfig> {
    Arc::new(AppConfig {
        matrix: MatrixConfig {
            server_name: "x".into(),
            username: "@fedwatch:x".into(),
            password: "secret".into(),
            log_room: log_room.into(),
        },
        monitor: MonitorConfig {
            interval_secs,
            probe_timeout_secs: 5,
            lookup_timeout_secs: 5,
            concurrency: 4,
        },
        retry: RetryConfig {
            strategy: RetryStrategy::Fixed,
            base_delay_secs: None,
            max_delay_secs: 3600,
        },
    })
}

fn unavailable() -> MatrixError {
    MatrixError::Homeserver {
        status: 502,
        errcode: "M_UNKNOWN".into(),
        message: "bad gateway".into(),
    }
}

// ─── Homeserver ──────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct FakeHomeserver {
    pub log_room: String,
    rooms: Vec<String>,
    members: HashMap<String, Vec<String>>,
    metadata: HashMap<String, RoomMetadata>,
    broken_members: HashSet<String>,
    fail_metadata: bool,
    fail_send: bool,
    room_list_failures: Arc<AtomicUsize>,
    room_list_calls: Arc<AtomicUsize>,
    member_calls: Arc<Mutex<Vec<String>>>,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl FakeHomeserver {
    /// Joined to `log_room` only.
    pub fn new(log_room: &str) -> Self {
        Self {
            log_room: log_room.to_owned(),
            rooms: vec![log_room.to_owned()],
            ..Default::default()
        }
    }

    pub fn with_room(mut self, room_id: &str, members: &[&str]) -> Self {
        if !self.rooms.iter().any(|r| r == room_id) {
            self.rooms.push(room_id.to_owned());
        }
        self.members
            .insert(room_id.to_owned(), members.iter().map(|m| (*m).to_owned()).collect());
        self
    }

    pub fn with_metadata(mut self, room_id: &str, alias: Option<&str>, title: Option<&str>) -> Self {
        self.metadata.insert(
            room_id.to_owned(),
            RoomMetadata { alias: alias.map(str::to_owned), title: title.map(str::to_owned) },
        );
        self
    }

    pub fn failing_metadata(mut self) -> Self {
        self.fail_metadata = true;
        self
    }

    pub fn failing_members(mut self, room_id: &str) -> Self {
        self.broken_members.insert(room_id.to_owned());
        self
    }

    pub fn failing_send(mut self) -> Self {
        self.fail_send = true;
        self
    }

    /// The first `times` room listings fail.
    pub fn failing_room_lists(self, times: usize) -> Self {
        self.room_list_failures.store(times, Ordering::SeqCst);
        self
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn member_calls(&self) -> Vec<String> {
        self.member_calls.lock().unwrap().clone()
    }

    pub fn room_list_calls(&self) -> usize {
        self.room_list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Homeserver for FakeHomeserver {
    async fn joined_rooms(&self) -> fedwatch_matrix::Result<Vec<String>> {
        self.room_list_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.room_list_failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.room_list_failures.store(remaining - 1, Ordering::SeqCst);
            return Err(unavailable());
        }
        Ok(self.rooms.clone())
    }

    async fn room_metadata(&self, room_id: &str) -> fedwatch_matrix::Result<RoomMetadata> {
        if self.fail_metadata {
            return Err(unavailable());
        }
        Ok(self.metadata.get(room_id).cloned().unwrap_or_default())
    }

    async fn joined_members(&self, room_id: &str) -> fedwatch_matrix::Result<Vec<String>> {
        self.member_calls.lock().unwrap().push(room_id.to_owned());
        if self.broken_members.contains(room_id) {
            return Err(unavailable());
        }
        Ok(self.members.get(room_id).cloned().unwrap_or_default())
    }

    async fn send_text(&self, room_id: &str, text: &str) -> fedwatch_matrix::Result<()> {
        if self.fail_send {
            return Err(unavailable());
        }
        self.sent.lock().unwrap().push((room_id.to_owned(), text.to_owned()));
        Ok(())
    }
}

// ─── Resolver / prober ───────────────────────────────────────────────────────

/// Resolves every domain to `<domain>:8448` unless told to fail it.
#[derive(Default)]
pub struct FakeResolver {
    failing: HashSet<String>,
}

impl FakeResolver {
    pub fn failing(domains: &[&str]) -> Self {
        Self { failing: domains.iter().map(|d| (*d).to_owned()).collect() }
    }
}

#[async_trait]
impl ServerResolver for FakeResolver {
    async fn resolve(&self, domain: &str) -> Result<ResolvedTarget, FederationError> {
        if self.failing.contains(domain) {
            return Err(FederationError::DiscoveryFailed(domain.to_owned(), "lookup exploded".into()));
        }
        Ok(ResolvedTarget::fallback(domain, DEFAULT_FED_PORT))
    }
}

/// Answers `true` for the listed targets only.
pub struct FakeProber {
    alive: HashSet<String>,
    pub calls: AtomicUsize,
}

impl FakeProber {
    pub fn alive(targets: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            alive: targets.iter().map(|t| (*t).to_owned()).collect(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl ReachabilityProbe for FakeProber {
    async fn probe(&self, target: &ResolvedTarget) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.alive.contains(target.as_str())
    }
}

pub fn sweeper(hs: &FakeHomeserver, resolver: FakeResolver, prober: Arc<FakeProber>) -> RoomSweeper {
    RoomSweeper::new(
        test_config(&hs.log_room, 60),
        Arc::new(hs.clone()),
        Arc::new(resolver),
        prober,
    )
}
