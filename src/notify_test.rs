use super::*;
use crate::error::ValidationError;

#[test]
fn constructors_set_level() {
    assert_eq!(Toast::success("Saved", "ok").level, ToastLevel::Success);
    assert_eq!(Toast::info("Note", "fyi").level, ToastLevel::Info);
    assert_eq!(Toast::error("Failed", "no").level, ToastLevel::Error);
}

#[test]
fn from_error_uses_user_message() {
    let err = ValidationError::Required { field: "company" };
    let toast = Toast::from_error("Generation failed", &err);
    assert_eq!(toast.level, ToastLevel::Error);
    assert_eq!(toast.title, "Generation failed");
    assert_eq!(toast.message, "company is required");
}

#[tokio::test]
async fn channel_sink_delivers_in_order() {
    let (sink, mut rx) = ToastSink::channel();
    sink.send(Toast::info("a", "1"));
    sink.send(Toast::info("b", "2"));
    assert_eq!(rx.recv().await.unwrap().title, "a");
    assert_eq!(rx.recv().await.unwrap().title, "b");
}

#[test]
fn channel_sink_survives_dropped_receiver() {
    let (sink, rx) = ToastSink::channel();
    drop(rx);
    sink.send(Toast::error("lost", "still logged"));
    ToastSink::Log.send(Toast::success("logged", "fine"));
}
