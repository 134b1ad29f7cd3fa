//! Live-presence reporter.
//!
//! Consumes the server-push online-count stream and fires a single best-effort
//! "track" beacon at startup. Stream failure closes the connection silently;
//! there is no reconnect in the baseline and no user-facing error.

use crate::backend::PresenceBackend;
use crate::model::{ConnectionStatus, PresenceState};
use futures::StreamExt;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Spawn the reporter tasks; returns the live presence snapshot.
pub fn spawn_presence_reporter(backend: Arc<dyn PresenceBackend>) -> watch::Receiver<PresenceState> {
    let (state_tx, state_rx) = watch::channel(PresenceState::default());

    // Startup beacon, isolated from the stream below. Errors are swallowed.
    let beacon = backend.clone();
    tokio::spawn(async move {
        if let Err(error) = beacon.track().await {
            debug!(%error, "track beacon failed");
        }
    });

    let mut stream = backend.online_stream();
    tokio::spawn(async move {
        let mut state = PresenceState::default();
        loop {
            match stream.next().await {
                Some(Ok(count)) => {
                    state.online_count = count;
                    state.connection = ConnectionStatus::Connected;
                    state_tx.send_replace(state.clone());
                }
                Some(Err(error)) => {
                    warn!(%error, "presence stream error, closing");
                    break;
                }
                None => {
                    debug!("presence stream ended");
                    break;
                }
            }
        }
        state.connection = ConnectionStatus::Disconnected;
        state_tx.send_replace(state);
    });

    state_rx
}
