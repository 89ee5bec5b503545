//! Realtime — apply documents pushed by other clients.
//!
//! Updates arrive whole on a broadcast channel. The listener applies those
//! for its own project to the shared controller; the newest document wins
//! and local undo history restarts from it. The controller's resulting
//! actions go back to the host on an mpsc channel.

use std::sync::Arc;

use canvas::doc::CanvasData;
use canvas::engine::{Action, CanvasController};
use tokio::sync::{Mutex, broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// A full canvas document published for a project.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteUpdate {
    pub project_id: String,
    pub data: CanvasData,
}

/// Spawn a task applying `project_id` updates from `rx` until the channel closes.
///
/// Actions produced by each update are sent on `actions` for the host to
/// render or persist.
pub fn spawn_realtime_listener(
    mut rx: broadcast::Receiver<RemoteUpdate>,
    project_id: impl Into<String>,
    controller: Arc<Mutex<CanvasController>>,
    actions: mpsc::Sender<Vec<Action>>,
) -> JoinHandle<()> {
    let project_id = project_id.into();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(update) if update.project_id == project_id => {
                    let elements = update.data.len();
                    let produced = controller.lock().await.apply_remote(update.data);
                    info!(%project_id, elements, actions = produced.len(), "realtime: remote update applied");
                    if actions.send(produced).await.is_err() {
                        debug!(%project_id, "realtime: host action channel closed");
                    }
                }
                Ok(update) => {
                    debug!(%project_id, other = %update.project_id, "realtime: update for another project ignored");
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(%project_id, skipped, "realtime: listener lagged; waiting for the next update");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        debug!(%project_id, "realtime: listener stopped");
    })
}

#[cfg(test)]
#[path = "realtime_test.rs"]
mod tests;
