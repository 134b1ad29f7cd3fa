#![allow(dead_code)]

//! Scripted mock backends shared by the integration tests. Each mock records
//! the calls it receives and replays results/streams the test sets up front.

use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use neatify_core::backend::{
    DownloadProgress, OrganizerBackend, PresenceBackend, ProgressItem, UpdateBackend,
};
use neatify_core::{Categories, CoreError, OrganizePlan, UpdateCheck};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio_stream::wrappers::UnboundedReceiverStream;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrganizerCall {
    Execute(String),
    Cancel,
    Undo(String),
    Plan(String),
}

pub struct MockOrganizer {
    pub calls: Mutex<Vec<OrganizerCall>>,
    pub execute_result: Mutex<Result<(), CoreError>>,
    pub undo_result: Mutex<Result<(), CoreError>>,
    pub plan_result: Mutex<Result<OrganizePlan, CoreError>>,
    /// Feed end of the progress stream handed out by `progress_stream`.
    pub progress: mpsc::UnboundedSender<ProgressItem>,
    progress_rx: Mutex<Option<mpsc::UnboundedReceiver<ProgressItem>>>,
}

impl MockOrganizer {
    pub fn new() -> Arc<Self> {
        let (progress, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            execute_result: Mutex::new(Ok(())),
            undo_result: Mutex::new(Ok(())),
            plan_result: Mutex::new(Ok(OrganizePlan::new())),
            progress,
            progress_rx: Mutex::new(Some(rx)),
        })
    }

    pub fn calls(&self) -> Vec<OrganizerCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: OrganizerCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OrganizerBackend for MockOrganizer {
    async fn execute(&self, path: &str, _categories: &Categories) -> Result<(), CoreError> {
        self.record(OrganizerCall::Execute(path.to_string()));
        self.execute_result.lock().unwrap().clone()
    }

    async fn cancel(&self) -> Result<(), CoreError> {
        self.record(OrganizerCall::Cancel);
        Ok(())
    }

    async fn undo(&self, path: &str) -> Result<(), CoreError> {
        self.record(OrganizerCall::Undo(path.to_string()));
        self.undo_result.lock().unwrap().clone()
    }

    async fn plan(&self, path: &str, _categories: &Categories) -> Result<OrganizePlan, CoreError> {
        self.record(OrganizerCall::Plan(path.to_string()));
        self.plan_result.lock().unwrap().clone()
    }

    fn progress_stream(&self) -> BoxStream<'static, ProgressItem> {
        let rx = self
            .progress_rx
            .lock()
            .unwrap()
            .take()
            .expect("progress stream subscribed twice");
        UnboundedReceiverStream::new(rx).boxed()
    }
}

pub struct MockUpdater {
    pub check_result: Mutex<Result<UpdateCheck, CoreError>>,
    pub changelog_result: Mutex<Result<String, CoreError>>,
    pub install_result: Mutex<Result<(), CoreError>>,
    /// Cumulative (bytes_received, total_bytes) pairs replayed on install.
    pub chunks: Mutex<Vec<(u64, u64)>>,
    pub checks: AtomicUsize,
    /// Each check consumes one permit; tests gate checks by starting at zero.
    pub gate: Semaphore,
}

impl MockUpdater {
    pub fn new() -> Arc<Self> {
        Self::with_gate(Semaphore::MAX_PERMITS)
    }

    pub fn gated() -> Arc<Self> {
        Self::with_gate(0)
    }

    fn with_gate(permits: usize) -> Arc<Self> {
        Arc::new(Self {
            check_result: Mutex::new(Ok(UpdateCheck {
                available: false,
                version: None,
            })),
            changelog_result: Mutex::new(Ok("changelog".into())),
            install_result: Mutex::new(Ok(())),
            chunks: Mutex::new(Vec::new()),
            checks: AtomicUsize::new(0),
            gate: Semaphore::new(permits),
        })
    }

    pub fn check_count(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl UpdateBackend for MockUpdater {
    async fn check(&self) -> Result<UpdateCheck, CoreError> {
        self.gate.acquire().await.expect("gate closed").forget();
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.check_result.lock().unwrap().clone()
    }

    async fn fetch_changelog(&self, _version: &str) -> Result<String, CoreError> {
        self.changelog_result.lock().unwrap().clone()
    }

    async fn download_and_install(&self, on_progress: DownloadProgress) -> Result<(), CoreError> {
        let chunks = self.chunks.lock().unwrap().clone();
        for (received, total) in chunks {
            on_progress(received, total);
        }
        self.install_result.lock().unwrap().clone()
    }
}

pub struct MockPresence {
    feed_tx: Mutex<Option<mpsc::UnboundedSender<Result<u64, CoreError>>>>,
    feed_rx: Mutex<Option<mpsc::UnboundedReceiver<Result<u64, CoreError>>>>,
    pub track_result: Mutex<Result<(), CoreError>>,
    pub tracked: AtomicUsize,
}

impl MockPresence {
    pub fn new() -> Arc<Self> {
        let (feed, rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            feed_tx: Mutex::new(Some(feed)),
            feed_rx: Mutex::new(Some(rx)),
            track_result: Mutex::new(Ok(())),
            tracked: AtomicUsize::new(0),
        })
    }

    pub fn send(&self, item: Result<u64, CoreError>) {
        if let Some(tx) = self.feed_tx.lock().unwrap().as_ref() {
            let _ = tx.send(item);
        }
    }

    /// Drop the feed end, ending the push stream.
    pub fn close(&self) {
        self.feed_tx.lock().unwrap().take();
    }

    pub fn track_count(&self) -> usize {
        self.tracked.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PresenceBackend for MockPresence {
    fn online_stream(&self) -> BoxStream<'static, Result<u64, CoreError>> {
        let rx = self
            .feed_rx
            .lock()
            .unwrap()
            .take()
            .expect("presence stream subscribed twice");
        UnboundedReceiverStream::new(rx).boxed()
    }

    async fn track(&self) -> Result<(), CoreError> {
        self.tracked.fetch_add(1, Ordering::SeqCst);
        self.track_result.lock().unwrap().clone()
    }
}

/// Config with a long enough check interval that only the startup tick fires.
pub fn test_config() -> neatify_core::CoreConfig {
    neatify_core::CoreConfig {
        current_version: "1.0.0".into(),
        update_check_interval: Duration::from_secs(300),
        notification_ttl: Duration::from_secs(30),
        notification_sweep_interval: Duration::from_secs(5),
    }
}

/// Await a watch channel until `pred` holds, returning the matching snapshot.
pub async fn wait_for<T: Clone>(
    rx: &mut watch::Receiver<T>,
    mut pred: impl FnMut(&T) -> bool,
) -> T {
    tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            {
                let current = rx.borrow();
                if pred(&current) {
                    return current.clone();
                }
            }
            rx.changed().await.expect("watch sender dropped");
        }
    })
    .await
    .expect("condition not reached within 2s")
}

/// Poll a plain predicate until it holds (for call-recording assertions).
pub async fn wait_until(mut pred: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(2), async {
        while !pred() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("condition not reached within 2s")
}
