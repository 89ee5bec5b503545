//! Interaction core for the planning canvas editor.
//!
//! This crate owns everything that happens between a raw pointer/keyboard
//! event and a committed change to a canvas document: coordinate transforms,
//! hit-testing, selection, per-element and group dragging, marquee selection,
//! undo/redo history, and scene rendering to SVG. It has no UI toolkit or
//! browser dependency; the host layer feeds events into a
//! [`engine::CanvasController`] and reacts to the [`engine::Action`]s it returns.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The generic canvas controller shared by every surface |
//! | [`doc`] | Canvas elements, typed payloads, and load-time normalization |
//! | [`camera`] | Pan/zoom camera and screen-to-canvas conversion |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Bounding boxes, hit-testing, marquee intersection |
//! | [`selection`] | Ordered selection set |
//! | [`drag`] | Drag sessions and group-delta clamping |
//! | [`history`] | Capped linear undo/redo stack |
//! | [`geometry`] | Hexagon points and label wrapping |
//! | [`render`] | Per-kind SVG renderers used for export |
//! | [`consts`] | Shared numeric constants (thresholds, caps, default sizes) |

pub mod camera;
pub mod consts;
pub mod doc;
pub mod drag;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod history;
pub mod input;
pub mod render;
pub mod selection;
