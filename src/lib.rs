//! planboard — service shell around the `canvas` interaction core.
//!
//! The `canvas` crate is synchronous and owns the editing semantics. This
//! crate adds everything that talks to the outside world: persistence
//! backends, the autosave worker, AI generation, export to PNG/PDF,
//! realtime updates, session storage, and the user-facing error surface.
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Typed configuration from environment variables |
//! | [`error`] | `UserFacing` trait, validation and error classification |
//! | [`notify`] | Toast notifications and their sinks |
//! | [`backend`] | Canvas/artifact/project persistence behind an async trait |
//! | [`autosave`] | Debounced autosave worker and save-status channel |
//! | [`generation`] | AI edge-function client with retry and timeout |
//! | [`session`] | Session key/value store, pending resume, guest quota |
//! | [`realtime`] | Applies remote document updates to a live controller |
//! | [`export`] | PNG/PDF export and data URLs |

pub mod autosave;
pub mod backend;
pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod notify;
pub mod pdf;
pub mod realtime;
pub mod session;
