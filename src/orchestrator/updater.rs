//! Update lifecycle coordinator.
//!
//! Periodic and on-demand version checks, best-effort changelog fetch, and
//! download/install with byte-level progress. Checks that arrive while one is
//! already in flight are dropped, not queued.

use crate::backend::{DownloadProgress, UpdateBackend};
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::model::{UpdateCheck, UpdatePhase, UpdateState};
use crate::notify::{Notifier, RetryFn};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

const CHANGELOG_PLACEHOLDER: &str = "No changelog available for this release.";

enum UpdateMsg {
    Check,
    Install,
    CheckDone {
        result: Result<UpdateCheck, CoreError>,
    },
    ChangelogDone {
        version: String,
        text: String,
    },
    DownloadProgress {
        received: u64,
        total: u64,
    },
    InstallDone {
        result: Result<(), CoreError>,
    },
}

/// Cloneable handle for triggering checks and installs on demand.
#[derive(Clone)]
pub struct UpdaterHandle {
    tx: mpsc::UnboundedSender<UpdateMsg>,
    state: watch::Receiver<UpdateState>,
}

impl UpdaterHandle {
    /// Spawn the coordinator task. The first interval tick fires immediately,
    /// so a check runs at startup and then every `update_check_interval`.
    pub fn spawn(backend: Arc<dyn UpdateBackend>, notifier: Notifier, cfg: &CoreConfig) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<UpdateMsg>();
        let initial = UpdateState::new(cfg.current_version.clone());
        let (state_tx, state_rx) = watch::channel(initial.clone());

        let mut coordinator = UpdateCoordinator {
            state: initial,
            backend,
            notifier,
            state_tx,
            self_tx: tx.clone(),
        };
        let check_interval = cfg.update_check_interval;
        tokio::spawn(async move {
            let mut ticker = interval(check_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    msg = rx.recv() => {
                        let Some(msg) = msg else { break };
                        coordinator.handle(msg);
                    }
                    _ = ticker.tick() => coordinator.on_check(),
                }
            }
        });

        Self { tx, state: state_rx }
    }

    pub fn check(&self) {
        let _ = self.tx.send(UpdateMsg::Check);
    }

    pub fn install(&self) {
        let _ = self.tx.send(UpdateMsg::Install);
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> UpdateState {
        self.state.borrow().clone()
    }
}

struct UpdateCoordinator {
    state: UpdateState,
    backend: Arc<dyn UpdateBackend>,
    notifier: Notifier,
    state_tx: watch::Sender<UpdateState>,
    self_tx: mpsc::UnboundedSender<UpdateMsg>,
}

impl UpdateCoordinator {
    fn handle(&mut self, msg: UpdateMsg) {
        match msg {
            UpdateMsg::Check => self.on_check(),
            UpdateMsg::Install => self.on_install(),
            UpdateMsg::CheckDone { result } => self.on_check_done(result),
            UpdateMsg::ChangelogDone { version, text } => self.on_changelog(version, text),
            UpdateMsg::DownloadProgress { received, total } => {
                self.on_download_progress(received, total)
            }
            UpdateMsg::InstallDone { result } => self.on_install_done(result),
        }
    }

    fn on_check(&mut self) {
        match self.state.phase {
            UpdatePhase::Checking | UpdatePhase::Downloading | UpdatePhase::Installing => {
                debug!(phase = ?self.state.phase, "check dropped; an update operation is in flight");
                return;
            }
            UpdatePhase::Idle | UpdatePhase::Available | UpdatePhase::Failed => {}
        }

        self.state.phase = UpdatePhase::Checking;
        self.state.candidate_version = None;
        self.state.download_percent = None;
        self.state.changelog = None;
        self.publish();

        let backend = self.backend.clone();
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = backend.check().await;
            let _ = self_tx.send(UpdateMsg::CheckDone { result });
        });
    }

    fn on_check_done(&mut self, result: Result<UpdateCheck, CoreError>) {
        if self.state.phase != UpdatePhase::Checking {
            debug!("ignoring check completion outside of Checking");
            return;
        }
        match result {
            Ok(check) if check.available => {
                let version = check.version.unwrap_or_else(|| "unknown".into());
                self.state.phase = UpdatePhase::Available;
                self.state.candidate_version = Some(version.clone());
                self.publish();
                info!(%version, "update available");
                self.notifier.info(format!("Update found: {version}"));

                let backend = self.backend.clone();
                let self_tx = self.self_tx.clone();
                tokio::spawn(async move {
                    let text = backend
                        .fetch_changelog(&version)
                        .await
                        .unwrap_or_else(|_| CHANGELOG_PLACEHOLDER.into());
                    let _ = self_tx.send(UpdateMsg::ChangelogDone { version, text });
                });
            }
            Ok(_) => {
                self.state.phase = UpdatePhase::Idle;
                self.publish();
                self.notifier.info("Already on the latest version");
            }
            Err(error) => {
                warn!(%error, "update check failed");
                self.state.phase = UpdatePhase::Idle;
                self.publish();
                self.notifier.error(format!("Update check failed: {error}"));
            }
        }
    }

    fn on_changelog(&mut self, version: String, text: String) {
        // Only attach if the candidate it was fetched for is still current.
        if self.state.candidate_version.as_deref() == Some(version.as_str()) {
            self.state.changelog = Some(text);
            self.publish();
        }
    }

    fn on_install(&mut self) {
        if self.state.phase != UpdatePhase::Available {
            debug!(phase = ?self.state.phase, "install ignored; no update staged");
            return;
        }
        self.state.phase = UpdatePhase::Downloading;
        self.state.download_percent = Some(0);
        self.publish();

        let progress_tx = self.self_tx.clone();
        let on_progress: DownloadProgress = Arc::new(move |received, total| {
            let _ = progress_tx.send(UpdateMsg::DownloadProgress { received, total });
        });

        let backend = self.backend.clone();
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = backend.download_and_install(on_progress).await;
            let _ = self_tx.send(UpdateMsg::InstallDone { result });
        });
    }

    fn on_download_progress(&mut self, received: u64, total: u64) {
        if self.state.phase != UpdatePhase::Downloading {
            return;
        }
        let percent = if total == 0 {
            0
        } else {
            ((received as f64 / total as f64) * 100.0).round() as i64
        };
        let percent = (percent.clamp(0, 100) as u8).max(self.state.download_percent.unwrap_or(0));
        self.state.download_percent = Some(percent);
        if percent == 100 {
            self.state.phase = UpdatePhase::Installing;
            info!("download complete, installing");
        }
        self.publish();
    }

    fn on_install_done(&mut self, result: Result<(), CoreError>) {
        match result {
            Ok(()) => {
                // A successful install terminates or restarts the process; if
                // we are still here, the state simply stays at Installing.
                info!("installer handed off");
            }
            Err(error) => {
                warn!(%error, "install failed");
                self.state.phase = UpdatePhase::Failed;
                self.state.candidate_version = None;
                self.state.download_percent = None;
                self.state.changelog = None;
                self.publish();

                let tx = self.self_tx.clone();
                let retry: RetryFn = Arc::new(move || {
                    let _ = tx.send(UpdateMsg::Check);
                });
                self.notifier
                    .error_with_retry(format!("Update failed: {error}"), retry);
            }
        }
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
