use super::*;
use std::time::Duration;

use canvas::doc::{CanvasElement, ElementKind, Position};

use crate::backend::MemoryBackend;
use crate::notify::ToastLevel;

fn config() -> AutosaveConfig {
    AutosaveConfig { delay_ms: 1000, saved_reset_ms: 2000, error_reset_ms: 3000 }
}

fn doc(n: usize) -> CanvasData {
    #[allow(clippy::cast_precision_loss)]
    let elements = (0..n).map(|i| CanvasElement::new(ElementKind::Sticky, Position::new(i as f64 * 10.0, 0.0))).collect();
    CanvasData::new(elements)
}

async fn advance(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

fn spawn(backend: &Arc<MemoryBackend>, exists: bool) -> Autosave {
    Autosave::spawn(backend.clone(), "p1", exists, config(), ToastSink::Log)
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn debounce_coalesces_rapid_changes() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.schedule(doc(1));
    advance(500).await;
    autosave.schedule(doc(2));
    advance(900).await;
    assert_eq!(backend.create_count(), 0);

    advance(200).await;
    assert_eq!(backend.create_count(), 1);
    assert_eq!(backend.canvas("p1").unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn first_save_creates_then_updates() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.save_now(doc(1));
    advance(10).await;
    autosave.save_now(doc(3));
    advance(10).await;

    assert_eq!((backend.create_count(), backend.update_count()), (1, 1));
    assert_eq!(backend.canvas("p1").unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn existing_record_is_updated() {
    let backend = Arc::new(MemoryBackend::new());
    backend.insert_canvas("p1", CanvasData::default());
    let autosave = spawn(&backend, true);

    autosave.save_now(doc(1));
    advance(10).await;
    assert_eq!((backend.create_count(), backend.update_count()), (0, 1));
}

#[tokio::test(start_paused = true)]
async fn flush_without_pending_is_a_no_op() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.flush();
    advance(5000).await;
    assert_eq!(backend.create_count(), 0);
    assert_eq!(autosave.status(), SaveStatus::Idle);
}

// =============================================================================
// Actions
// =============================================================================

#[tokio::test(start_paused = true)]
async fn persist_action_schedules_and_flush_saves_now() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.apply_actions(&[Action::Persist { flush: false }, Action::RenderNeeded], &doc(1));
    advance(10).await;
    assert_eq!(backend.create_count(), 0);
    advance(1000).await;
    assert_eq!(backend.create_count(), 1);

    autosave.apply_actions(&[Action::Persist { flush: true }], &doc(2));
    advance(10).await;
    assert_eq!(backend.update_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn non_persist_actions_are_ignored() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.apply_actions(&[Action::RenderNeeded, Action::SelectionChanged(vec!["a".into()])], &doc(1));
    advance(5000).await;
    assert_eq!(backend.create_count(), 0);
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test(start_paused = true)]
async fn saved_status_resets_to_idle() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);
    let status = autosave.subscribe();

    autosave.save_now(doc(1));
    advance(10).await;
    assert_eq!(autosave.status(), SaveStatus::Saved);
    assert_eq!(*status.borrow(), SaveStatus::Saved);

    advance(1900).await;
    assert_eq!(autosave.status(), SaveStatus::Saved);
    advance(200).await;
    assert_eq!(autosave.status(), SaveStatus::Idle);
}

#[tokio::test(start_paused = true)]
async fn failed_save_toasts_and_is_not_retried() {
    let backend = Arc::new(MemoryBackend::new());
    backend.set_fail_writes(true);
    let (toasts, mut toast_rx) = ToastSink::channel();
    let autosave = Autosave::spawn(backend.clone(), "p1", false, config(), toasts);

    autosave.save_now(doc(1));
    advance(10).await;
    assert_eq!(autosave.status(), SaveStatus::Error);

    let toast = toast_rx.try_recv().unwrap();
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.title, "Save failed");

    backend.set_fail_writes(false);
    advance(3100).await;
    assert_eq!(autosave.status(), SaveStatus::Idle);
    assert_eq!(backend.create_count(), 0);
    assert!(toast_rx.try_recv().is_err());
}

// =============================================================================
// Shutdown
// =============================================================================

#[tokio::test(start_paused = true)]
async fn close_saves_pending_changes() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.schedule(doc(2));
    autosave.close().await;
    assert_eq!(backend.create_count(), 1);
    assert_eq!(backend.canvas("p1").unwrap().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_saves_pending_changes() {
    let backend = Arc::new(MemoryBackend::new());
    let autosave = spawn(&backend, false);

    autosave.schedule(doc(1));
    drop(autosave);
    advance(10).await;
    assert_eq!(backend.create_count(), 1);
}
