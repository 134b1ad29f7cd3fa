//! Notification center: ephemeral, auto-expiring user-facing outcome messages.
//!
//! Any component pushes (message, severity, optional retry action); ownership
//! of the entry transfers here until it expires on a fixed TTL or is dismissed
//! explicitly. Presentation layers read the watch snapshot and never mutate.

use crate::model::Severity;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, Duration, Instant};

/// Retry action bound to the arguments of the failed operation. The center
/// only stores it; the presentation layer invokes it.
pub type RetryFn = Arc<dyn Fn() + Send + Sync>;

#[derive(Clone)]
pub struct Notification {
    pub id: u64,
    pub message: String,
    pub severity: Severity,
    pub created_utc: String,
    pub retry: Option<RetryFn>,
    pub expires_at: Instant,
}

impl fmt::Debug for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Notification")
            .field("id", &self.id)
            .field("message", &self.message)
            .field("severity", &self.severity)
            .field("created_utc", &self.created_utc)
            .field("has_retry", &self.retry.is_some())
            .finish()
    }
}

enum NotifyCmd {
    Push {
        message: String,
        severity: Severity,
        retry: Option<RetryFn>,
    },
    Dismiss(u64),
}

/// Cloneable handle components use to emit notifications.
#[derive(Clone)]
pub struct Notifier {
    tx: mpsc::UnboundedSender<NotifyCmd>,
}

impl Notifier {
    pub fn info(&self, message: impl Into<String>) {
        self.push(message.into(), Severity::Info, None);
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(message.into(), Severity::Success, None);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(message.into(), Severity::Error, None);
    }

    pub fn error_with_retry(&self, message: impl Into<String>, retry: RetryFn) {
        self.push(message.into(), Severity::Error, Some(retry));
    }

    pub fn dismiss(&self, id: u64) {
        let _ = self.tx.send(NotifyCmd::Dismiss(id));
    }

    fn push(&self, message: String, severity: Severity, retry: Option<RetryFn>) {
        let _ = self.tx.send(NotifyCmd::Push {
            message,
            severity,
            retry,
        });
    }
}

/// Owns the live notification list inside a single task.
pub struct NotificationCenter;

impl NotificationCenter {
    /// Spawn the center task. Returns the push handle and the live snapshot.
    pub fn spawn(
        ttl: Duration,
        sweep_interval: Duration,
    ) -> (Notifier, watch::Receiver<Vec<Notification>>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<NotifyCmd>();
        let (state_tx, state_rx) = watch::channel(Vec::new());

        tokio::spawn(async move {
            let mut entries: Vec<Notification> = Vec::new();
            let mut next_id: u64 = 1;
            let mut sweep = interval(sweep_interval);

            loop {
                tokio::select! {
                    cmd = rx.recv() => {
                        let Some(cmd) = cmd else { break };
                        match cmd {
                            NotifyCmd::Push { message, severity, retry } => {
                                entries.push(Notification {
                                    id: next_id,
                                    message,
                                    severity,
                                    created_utc: now_rfc3339(),
                                    retry,
                                    expires_at: Instant::now() + ttl,
                                });
                                next_id += 1;
                                let _ = state_tx.send(entries.clone());
                            }
                            NotifyCmd::Dismiss(id) => {
                                entries.retain(|n| n.id != id);
                                let _ = state_tx.send(entries.clone());
                            }
                        }
                    }
                    _ = sweep.tick() => {
                        let now = Instant::now();
                        let before = entries.len();
                        entries.retain(|n| n.expires_at > now);
                        if entries.len() != before {
                            let _ = state_tx.send(entries.clone());
                        }
                    }
                }
            }
        });

        (Notifier { tx }, state_rx)
    }
}

fn now_rfc3339() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "now".into())
}
