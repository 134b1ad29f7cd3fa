//! Opaque capabilities implemented by the external execution backend.
//!
//! The core never touches the filesystem or the network itself; everything
//! below is a trait object handed in by the embedding shell. Completions and
//! stream items are the only way backend activity reaches the state machines.

use crate::error::CoreError;
use crate::model::{Categories, OrganizePlan, UpdateCheck};
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::sync::Arc;

/// Item on the job progress stream: an integer percent in transport order.
/// `Err` marks a payload the transport could not decode.
pub type ProgressItem = Result<i64, CoreError>;

/// Cumulative download progress callback: (bytes_received, total_bytes).
pub type DownloadProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// File reorganization backend: the single cancellable, undoable job.
#[async_trait]
pub trait OrganizerBackend: Send + Sync {
    /// Kick off reorganization of `path`. Resolves with the acceptance ack;
    /// actual completion is signalled by the progress stream reaching 100.
    async fn execute(&self, path: &str, categories: &Categories) -> Result<(), CoreError>;

    /// Best-effort cancellation of the running job.
    async fn cancel(&self) -> Result<(), CoreError>;

    /// Restore the folder at `path` to its pre-reorganization layout.
    async fn undo(&self, path: &str) -> Result<(), CoreError>;

    /// Dry run: report where each file would go without moving anything.
    async fn plan(&self, path: &str, categories: &Categories) -> Result<OrganizePlan, CoreError>;

    /// Push stream of percent values 0–100. There is no explicit end marker;
    /// a value of 100 implies completion. Subscribed to once per session.
    fn progress_stream(&self) -> BoxStream<'static, ProgressItem>;
}

/// Application update channel.
#[async_trait]
pub trait UpdateBackend: Send + Sync {
    async fn check(&self) -> Result<UpdateCheck, CoreError>;

    /// Best-effort network resource; callers substitute a placeholder on failure.
    async fn fetch_changelog(&self, version: &str) -> Result<String, CoreError>;

    /// Download and install the pending update, reporting cumulative bytes
    /// through `on_progress`. On success the process is expected to terminate
    /// or restart, so there is no further observable state.
    async fn download_and_install(&self, on_progress: DownloadProgress) -> Result<(), CoreError>;
}

/// Live presence endpoint.
#[async_trait]
pub trait PresenceBackend: Send + Sync {
    /// Long-lived push stream of online-count messages.
    fn online_stream(&self) -> BoxStream<'static, Result<u64, CoreError>>;

    /// Fire-and-forget startup beacon; failures are swallowed by the caller.
    async fn track(&self) -> Result<(), CoreError>;
}
