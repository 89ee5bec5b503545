//! Autosave — debounced background saves for one open canvas.
//!
//! DESIGN
//! ======
//! One tokio task per editor. Every change reschedules a single timer; when
//! it fires, the latest document is written. `flush` skips the wait. The
//! current [`SaveStatus`] is published on a `watch` channel so a status
//! badge can follow it without polling.
//!
//! ERROR HANDLING
//! ==============
//! A failed save shows an error toast and moves to `Error`; it is not
//! retried. The next change schedules a fresh save with the newest data.
//! Closing the handle saves anything still pending before the task exits.

use std::sync::Arc;

use canvas::doc::CanvasData;
use canvas::engine::Action;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::backend::CanvasBackend;
use crate::config::AutosaveConfig;
use crate::notify::{Toast, ToastSink};

/// Save indicator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaveStatus {
    #[default]
    Idle,
    Saving,
    Saved,
    Error,
}

enum Command {
    Schedule(CanvasData),
    Flush,
}

/// Handle to a running autosave worker.
pub struct Autosave {
    tx: mpsc::UnboundedSender<Command>,
    status: watch::Receiver<SaveStatus>,
    task: JoinHandle<()>,
}

impl Autosave {
    /// Start a worker for `project_id`.
    ///
    /// `record_exists` says whether the backend already has a canvas for the
    /// project; when it does not, the first save creates it.
    #[must_use]
    pub fn spawn(
        backend: Arc<dyn CanvasBackend>,
        project_id: impl Into<String>,
        record_exists: bool,
        config: AutosaveConfig,
        toasts: ToastSink,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (status_tx, status) = watch::channel(SaveStatus::Idle);
        let worker = Worker { backend, project_id: project_id.into(), record_exists, config, toasts, status: status_tx };
        info!(project_id = %worker.project_id, delay_ms = config.delay_ms, "autosave worker started");
        let task = tokio::spawn(worker.run(rx));
        Self { tx, status, task }
    }

    /// Replace the pending document and restart the debounce timer.
    pub fn schedule(&self, data: CanvasData) {
        self.send(Command::Schedule(data));
    }

    /// Save any pending document now.
    pub fn flush(&self) {
        self.send(Command::Flush);
    }

    /// Schedule `data` and save it immediately.
    pub fn save_now(&self, data: CanvasData) {
        self.schedule(data);
        self.flush();
    }

    /// Route controller actions: each `Persist` schedules `data`, and a
    /// flushing one saves it right away.
    pub fn apply_actions(&self, actions: &[Action], data: &CanvasData) {
        let mut persist = false;
        let mut flush = false;
        for action in actions {
            if let Action::Persist { flush: f } = action {
                persist = true;
                flush |= *f;
            }
        }
        if persist {
            self.schedule(data.clone());
        }
        if flush {
            self.flush();
        }
    }

    #[must_use]
    pub fn status(&self) -> SaveStatus {
        *self.status.borrow()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SaveStatus> {
        self.status.clone()
    }

    /// Save anything pending and wait for the worker to stop.
    pub async fn close(self) {
        let Self { tx, task, .. } = self;
        drop(tx);
        if let Err(e) = task.await {
            error!(error = %e, "autosave worker ended abnormally");
        }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            warn!("autosave worker is gone; change not scheduled");
        }
    }
}

// =============================================================================
// WORKER
// =============================================================================

struct Worker {
    backend: Arc<dyn CanvasBackend>,
    project_id: String,
    record_exists: bool,
    config: AutosaveConfig,
    toasts: ToastSink,
    status: watch::Sender<SaveStatus>,
}

impl Worker {
    async fn run(mut self, mut rx: mpsc::UnboundedReceiver<Command>) {
        let mut pending: Option<CanvasData> = None;
        let mut save_at: Option<Instant> = None;
        let mut reset_at: Option<Instant> = None;

        loop {
            tokio::select! {
                command = rx.recv() => match command {
                    Some(Command::Schedule(data)) => {
                        pending = Some(data);
                        save_at = Some(Instant::now() + self.config.delay());
                    }
                    Some(Command::Flush) => {
                        save_at = None;
                        if let Some(data) = pending.take() {
                            reset_at = Some(self.save(&data).await);
                        }
                    }
                    None => {
                        if let Some(data) = pending.take() {
                            self.save(&data).await;
                        }
                        break;
                    }
                },
                () = sleep_until(save_at) => {
                    save_at = None;
                    if let Some(data) = pending.take() {
                        reset_at = Some(self.save(&data).await);
                    }
                }
                () = sleep_until(reset_at) => {
                    reset_at = None;
                    self.status.send_replace(SaveStatus::Idle);
                }
            }
        }
        debug!(project_id = %self.project_id, "autosave worker stopped");
    }

    /// Write `data`, publish the outcome, and return when the badge resets.
    async fn save(&mut self, data: &CanvasData) -> Instant {
        self.status.send_replace(SaveStatus::Saving);
        let result = if self.record_exists {
            self.backend.update_canvas(&self.project_id, data).await
        } else {
            self.backend.create_canvas(&self.project_id, data).await
        };

        match result {
            Ok(()) => {
                self.record_exists = true;
                info!(project_id = %self.project_id, elements = data.len(), "autosave: saved");
                self.status.send_replace(SaveStatus::Saved);
                Instant::now() + self.config.saved_reset()
            }
            Err(e) => {
                error!(project_id = %self.project_id, error = %e, "autosave: save failed");
                self.toasts.send(Toast::from_error("Save failed", &e));
                self.status.send_replace(SaveStatus::Error);
                Instant::now() + self.config.error_reset()
            }
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "autosave_test.rs"]
mod tests;
