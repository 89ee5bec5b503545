//! Toast notifications.
//!
//! Every user-initiated action that fails ends as a [`Toast`]. Services take a
//! [`ToastSink`] and never decide how the toast is shown: a UI host reads the
//! channel, the CLI logs it.

use tokio::sync::mpsc;
use tracing::{error, info, warn};

use crate::error::UserFacing;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub title: String,
    pub message: String,
}

impl Toast {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Success, title: title.into(), message: message.into() }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Info, title: title.into(), message: message.into() }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self { level: ToastLevel::Error, title: title.into(), message: message.into() }
    }

    /// Error toast carrying the error's user message.
    pub fn from_error<E: UserFacing + ?Sized>(title: impl Into<String>, err: &E) -> Self {
        Self::error(title, err.user_message())
    }
}

/// Where toasts go.
#[derive(Debug, Clone)]
pub enum ToastSink {
    /// Forward to a UI host.
    Channel(mpsc::UnboundedSender<Toast>),
    /// Write to the tracing log.
    Log,
}

impl ToastSink {
    /// A channel sink and the receiver the host drains.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Toast>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::Channel(tx), rx)
    }

    pub fn send(&self, toast: Toast) {
        match self {
            Self::Channel(tx) => {
                if let Err(mpsc::error::SendError(toast)) = tx.send(toast) {
                    warn!(title = %toast.title, "toast receiver dropped; logging instead");
                    log_toast(&toast);
                }
            }
            Self::Log => log_toast(&toast),
        }
    }
}

fn log_toast(toast: &Toast) {
    match toast.level {
        ToastLevel::Success | ToastLevel::Info => info!(title = %toast.title, message = %toast.message, "toast"),
        ToastLevel::Error => error!(title = %toast.title, message = %toast.message, "toast"),
    }
}

#[cfg(test)]
#[path = "notify_test.rs"]
mod tests;
