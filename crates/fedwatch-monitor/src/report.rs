//! Per-room sweep data and the text of the report message.

use std::collections::BTreeSet;

use fedwatch_common::extract_domain;
use fedwatch_federation::CheckResult;
use fedwatch_matrix::RoomMetadata;

/// Title shown when a room's name cannot be looked up.
pub const UNKNOWN_TITLE: &str = "(unknown title)";

/// What a sweep knows about a room before any network check runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub alias: String,
    pub title: String,
    /// Distinct, non-empty member domains in sorted order.
    pub domains: BTreeSet<String>,
}

impl RoomSnapshot {
    /// Build a snapshot from best-effort metadata and the raw member list.
    ///
    /// Missing alias falls back to the room ID, missing title to
    /// [`UNKNOWN_TITLE`]. Members without a `:` contribute nothing.
    pub fn new<I, S>(room_id: &str, metadata: Option<RoomMetadata>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let metadata = metadata.unwrap_or_default();
        let domains = members
            .into_iter()
            .filter_map(|member| {
                let domain = extract_domain(member.as_ref());
                (!domain.is_empty()).then(|| domain.to_owned())
            })
            .collect();

        Self {
            room_id: room_id.to_owned(),
            alias: metadata.alias.unwrap_or_else(|| room_id.to_owned()),
            title: metadata.title.unwrap_or_else(|| UNKNOWN_TITLE.to_owned()),
            domains,
        }
    }

    /// `"<alias> (<title>)"`, used as the prefix of every report.
    pub fn description(&self) -> String {
        format!("{} ({})", self.alias, self.title)
    }
}

/// One domain's outcome in one sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainStatus {
    pub domain: String,
    pub result: CheckResult,
}

impl DomainStatus {
    /// `"<domain> - <status>"`
    pub fn line(&self) -> String {
        format!("{} - {}", self.domain, self.result)
    }
}

/// Result of sweeping one room.
#[derive(Debug, Clone)]
pub struct SweepReport {
    pub room_id: String,
    pub description: String,
    /// Every checked domain, sorted by domain.
    pub statuses: Vec<DomainStatus>,
    /// Whether the report message reached the log room.
    pub delivered: bool,
}

impl SweepReport {
    pub fn new(snapshot: &RoomSnapshot, mut statuses: Vec<DomainStatus>) -> Self {
        statuses.sort_by(|a, b| a.domain.cmp(&b.domain));
        Self {
            room_id: snapshot.room_id.clone(),
            description: snapshot.description(),
            statuses,
            delivered: false,
        }
    }

    pub fn failures(&self) -> impl Iterator<Item = &DomainStatus> {
        self.statuses.iter().filter(|s| !s.result.is_ok())
    }

    pub fn has_failures(&self) -> bool {
        self.failures().next().is_some()
    }

    /// All status lines, OK and failed. Logged, never sent.
    pub fn status_lines(&self) -> Vec<String> {
        self.statuses.iter().map(DomainStatus::line).collect()
    }

    /// The single message posted to the log room.
    pub fn message(&self) -> String {
        if !self.has_failures() {
            return format!("✅ All servers in {} are OK", self.description);
        }
        let lines: Vec<String> = self.failures().map(DomainStatus::line).collect();
        format!(
            "❌ Federation problems in {}:\n{}",
            self.description,
            lines.join("\n")
        )
    }
}
