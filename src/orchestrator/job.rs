//! Job lifecycle controller.
//!
//! Owns the single active job's state machine and the generation filter that
//! keeps progress events from a cancelled or superseded job from reopening it.
//! All state mutation happens inside one task loop; external calls are spawned
//! and their completions posted back onto the same queue.

use crate::backend::{OrganizerBackend, ProgressItem};
use crate::error::CoreError;
use crate::model::{Categories, JobPhase, JobState, OrganizePlan};
use crate::notify::Notifier;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, info, warn};

enum JobMsg {
    Start {
        path: String,
        categories: Categories,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    Cancel,
    Undo {
        path: String,
        reply: oneshot::Sender<Result<(), CoreError>>,
    },
    Plan {
        path: String,
        categories: Categories,
        reply: oneshot::Sender<Result<OrganizePlan, CoreError>>,
    },
    Progress {
        percent: i64,
        generation: u64,
    },
    ExecuteRejected {
        generation: u64,
        error: CoreError,
    },
    UndoFinished {
        result: Result<(), CoreError>,
    },
}

/// Cloneable handle presentation layers use to drive the job.
#[derive(Clone)]
pub struct JobHandle {
    tx: mpsc::UnboundedSender<JobMsg>,
    state: watch::Receiver<JobState>,
}

impl JobHandle {
    /// Spawn the controller task and its progress consumer.
    pub fn spawn(backend: Arc<dyn OrganizerBackend>, notifier: Notifier) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<JobMsg>();
        let (state_tx, state_rx) = watch::channel(JobState::default());
        let (gen_tx, gen_rx) = watch::channel(0u64);

        spawn_progress_consumer(backend.progress_stream(), gen_rx, tx.clone());

        let mut controller = JobController {
            state: JobState::default(),
            backend,
            notifier,
            state_tx,
            gen_tx,
            self_tx: tx.clone(),
        };
        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                controller.handle(msg);
            }
        });

        Self { tx, state: state_rx }
    }

    /// Start organizing `path`. Returns immediately once the controller has
    /// validated the request; completion is reported through the progress
    /// state and notifications.
    pub async fn start(
        &self,
        path: impl Into<String>,
        categories: Categories,
    ) -> Result<(), CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(JobMsg::Start {
            path: path.into(),
            categories,
            reply,
        })?;
        rx.await.map_err(|_| controller_gone())?
    }

    /// Cancel the running job. Local state resets immediately regardless of
    /// whether the backend acknowledges.
    pub fn cancel(&self) {
        let _ = self.tx.send(JobMsg::Cancel);
    }

    /// Undo a previous reorganization of `path`. The outcome arrives as a
    /// notification; the job phase is untouched.
    pub async fn undo(&self, path: impl Into<String>) -> Result<(), CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(JobMsg::Undo {
            path: path.into(),
            reply,
        })?;
        rx.await.map_err(|_| controller_gone())?
    }

    /// Preview which files would move where, without moving anything.
    pub async fn plan(
        &self,
        path: impl Into<String>,
        categories: Categories,
    ) -> Result<OrganizePlan, CoreError> {
        let (reply, rx) = oneshot::channel();
        self.send(JobMsg::Plan {
            path: path.into(),
            categories,
            reply,
        })?;
        rx.await.map_err(|_| controller_gone())?
    }

    pub fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state.clone()
    }

    pub fn snapshot(&self) -> JobState {
        self.state.borrow().clone()
    }

    fn send(&self, msg: JobMsg) -> Result<(), CoreError> {
        self.tx.send(msg).map_err(|_| controller_gone())
    }
}

fn controller_gone() -> CoreError {
    CoreError::Transport("job controller task is gone".into())
}

/// Forwards raw stream values into the controller queue, tagged with the
/// generation of the most recently started job. Cancel bumps the controller's
/// own counter without touching this one, which is what invalidates late
/// arrivals from the cancelled attempt.
fn spawn_progress_consumer(
    mut stream: BoxStream<'static, ProgressItem>,
    gen_rx: watch::Receiver<u64>,
    tx: mpsc::UnboundedSender<JobMsg>,
) {
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(percent) => {
                    let generation = *gen_rx.borrow();
                    if tx.send(JobMsg::Progress { percent, generation }).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "dropping malformed progress payload");
                }
            }
        }
        debug!("progress stream ended");
    });
}

struct JobController {
    state: JobState,
    backend: Arc<dyn OrganizerBackend>,
    notifier: Notifier,
    state_tx: watch::Sender<JobState>,
    gen_tx: watch::Sender<u64>,
    self_tx: mpsc::UnboundedSender<JobMsg>,
}

impl JobController {
    fn handle(&mut self, msg: JobMsg) {
        match msg {
            JobMsg::Start {
                path,
                categories,
                reply,
            } => {
                let _ = reply.send(self.start(path, categories));
            }
            JobMsg::Cancel => self.cancel(),
            JobMsg::Undo { path, reply } => {
                let _ = reply.send(self.undo(path));
            }
            JobMsg::Plan {
                path,
                categories,
                reply,
            } => self.plan(path, categories, reply),
            JobMsg::Progress {
                percent,
                generation,
            } => self.on_progress(percent, generation),
            JobMsg::ExecuteRejected { generation, error } => {
                self.on_execute_rejected(generation, error)
            }
            JobMsg::UndoFinished { result } => self.on_undo_finished(result),
        }
    }

    fn start(&mut self, path: String, categories: Categories) -> Result<(), CoreError> {
        if path.trim().is_empty() {
            return Err(CoreError::InvalidInput("no folder selected".into()));
        }
        if self.state.phase == JobPhase::Running {
            return Err(CoreError::AlreadyRunning);
        }

        self.state.generation += 1;
        self.state.phase = JobPhase::Running;
        self.state.percent = 0;
        self.state.status_message = "Starting...".into();
        let _ = self.gen_tx.send(self.state.generation);
        self.publish();
        info!(generation = self.state.generation, %path, "job started");

        let backend = self.backend.clone();
        let self_tx = self.self_tx.clone();
        let generation = self.state.generation;
        tokio::spawn(async move {
            if let Err(error) = backend.execute(&path, &categories).await {
                let _ = self_tx.send(JobMsg::ExecuteRejected { generation, error });
            }
        });
        Ok(())
    }

    fn on_progress(&mut self, percent: i64, generation: u64) {
        if generation != self.state.generation {
            debug!(
                generation,
                current = self.state.generation,
                "discarding stale progress event"
            );
            return;
        }
        if self.state.phase != JobPhase::Running {
            // A repeated 100 after completion is an idempotent no-op.
            return;
        }

        let percent = (percent.clamp(0, 100) as u8).max(self.state.percent);
        self.state.percent = percent;

        if percent == 100 {
            self.state.phase = JobPhase::Completing;
            self.publish();
            self.state.phase = JobPhase::Idle;
            self.state.status_message = "Done".into();
            self.publish();
            self.notifier.success("Files organized");
            info!(generation, "job completed");
        } else {
            self.state.status_message = format!("Organizing... {percent}%");
            self.publish();
        }
    }

    fn cancel(&mut self) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(error) = backend.cancel().await {
                warn!(%error, "cancel was not acknowledged by the backend");
            }
        });

        // Local reset does not wait for the backend ack. The generation bump
        // is what keeps in-flight progress events from reopening this job.
        self.state.generation += 1;
        self.state.phase = JobPhase::Idle;
        self.state.percent = 0;
        self.state.status_message = "Stopped".into();
        self.publish();
        self.notifier.info("Operation cancelled");
        info!(generation = self.state.generation, "job cancelled");
    }

    fn undo(&mut self, path: String) -> Result<(), CoreError> {
        if path.trim().is_empty() {
            return Err(CoreError::InvalidInput("no folder selected".into()));
        }
        let backend = self.backend.clone();
        let self_tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = backend.undo(&path).await;
            let _ = self_tx.send(JobMsg::UndoFinished { result });
        });
        Ok(())
    }

    fn on_undo_finished(&mut self, result: Result<(), CoreError>) {
        match result {
            Ok(()) => {
                self.state.percent = 0;
                self.publish();
                self.notifier.success("Undo complete");
            }
            Err(error) => {
                warn!(%error, "undo failed");
                self.notifier.error(format!("Undo failed: {error}"));
            }
        }
    }

    fn plan(
        &mut self,
        path: String,
        categories: Categories,
        reply: oneshot::Sender<Result<OrganizePlan, CoreError>>,
    ) {
        if path.trim().is_empty() {
            let _ = reply.send(Err(CoreError::InvalidInput("no folder selected".into())));
            return;
        }
        let backend = self.backend.clone();
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            let result = backend.plan(&path, &categories).await;
            if let Err(error) = &result {
                warn!(%error, "plan preview failed");
                notifier.error(format!("Preview failed: {error}"));
            }
            let _ = reply.send(result);
        });
    }

    fn on_execute_rejected(&mut self, generation: u64, error: CoreError) {
        if generation != self.state.generation {
            debug!(generation, "ignoring rejection from a superseded job");
            return;
        }
        warn!(%error, "execute rejected");
        self.state.phase = JobPhase::Idle;
        self.state.percent = 0;
        self.state.status_message = "Failed".into();
        self.publish();
        self.notifier.error(format!("Organizing failed: {error}"));
    }

    fn publish(&self) {
        self.state_tx.send_replace(self.state.clone());
    }
}
