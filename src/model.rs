use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Category name mapped to the file extensions it should collect.
pub type Categories = HashMap<String, Vec<String>>;

/// Dry-run preview: category name mapped to the file names that would move there.
pub type OrganizePlan = HashMap<String, Vec<String>>;

/// Discrete lifecycle state of the single tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum JobPhase {
    #[default]
    Idle,
    Running,
    /// Transient state observed for the single tick in which progress hits 100.
    Completing,
}

/// Snapshot of the active job. Exactly one instance exists process-wide,
/// owned by the job controller task; presentation layers only read copies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct JobState {
    pub phase: JobPhase,
    /// 0–100, non-decreasing while `phase == Running` within one generation.
    pub percent: u8,
    pub status_message: String,
    /// Monotonic counter distinguishing job attempts; progress events carrying
    /// an older value are stale and get discarded.
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UpdatePhase {
    #[default]
    Idle,
    Checking,
    Available,
    Downloading,
    Installing,
    Failed,
}

/// Snapshot of the update lifecycle.
///
/// Invariant: `candidate_version` is set iff `phase` is one of
/// Available/Downloading/Installing. The changelog rides along with the
/// candidate and is cleared with it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateState {
    pub phase: UpdatePhase,
    pub current_version: String,
    pub candidate_version: Option<String>,
    pub download_percent: Option<u8>,
    pub changelog: Option<String>,
}

impl UpdateState {
    pub fn new(current_version: impl Into<String>) -> Self {
        Self {
            current_version: current_version.into(),
            ..Default::default()
        }
    }
}

/// Outcome of a version check against the update channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCheck {
    pub available: bool,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConnectionStatus {
    Connected,
    #[default]
    Disconnected,
}

/// Live count of connected clients as reported by the presence endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PresenceState {
    pub online_count: u64,
    pub connection: ConnectionStatus,
}

/// Severity of a user-facing notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Error,
}
