//! Orchestration core for the Neatify file organizer.
//!
//! Coordinates a single long-running, cancellable, undoable file
//! reorganization job with fractional progress, plus two independent
//! subsystems: an application-update checker/installer and a live-presence
//! reporter. The file-moving algorithm, the UI, and the concrete transports
//! live outside this crate behind the traits in [`backend`].
//!
//! Every component runs as one tokio task that exclusively owns its state and
//! processes a serialized message queue; presentation layers read snapshots
//! through `tokio::sync::watch` and push commands through cheap cloneable
//! handles.

pub mod backend;
mod config;
mod error;
mod model;
mod notify;
mod orchestrator;

pub use config::CoreConfig;
pub use error::CoreError;
pub use model::{
    Categories, ConnectionStatus, JobPhase, JobState, OrganizePlan, PresenceState, Severity,
    UpdateCheck, UpdatePhase, UpdateState,
};
pub use notify::{Notification, NotificationCenter, Notifier, RetryFn};
pub use orchestrator::{spawn_presence_reporter, JobHandle, UpdaterHandle};

use backend::{OrganizerBackend, PresenceBackend, UpdateBackend};
use std::sync::Arc;
use tokio::sync::watch;

/// Fully wired core: all component tasks running against the given backends.
pub struct Core {
    pub job: JobHandle,
    pub updater: UpdaterHandle,
    pub presence: watch::Receiver<PresenceState>,
    pub notifications: watch::Receiver<Vec<Notification>>,
    pub notifier: Notifier,
}

impl Core {
    /// Spawn every component task. Must be called from within a tokio runtime.
    pub fn spawn(
        cfg: CoreConfig,
        organizer: Arc<dyn OrganizerBackend>,
        updates: Arc<dyn UpdateBackend>,
        presence: Arc<dyn PresenceBackend>,
    ) -> Self {
        let (notifier, notifications) =
            NotificationCenter::spawn(cfg.notification_ttl, cfg.notification_sweep_interval);
        let job = JobHandle::spawn(organizer, notifier.clone());
        let updater = UpdaterHandle::spawn(updates, notifier.clone(), &cfg);
        let presence = spawn_presence_reporter(presence);
        Self {
            job,
            updater,
            presence,
            notifications,
            notifier,
        }
    }
}
