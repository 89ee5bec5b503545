//! Input model: modifier keys, mouse buttons, keys, toolbar commands, and the
//! gesture state machine.
//!
//! `Modifiers` and `Button` capture the user's intent at the time of a pointer
//! event. `InputState` is the active gesture being tracked between pointer-down
//! and pointer-up, carrying all context needed to compute previews and emit
//! the final document mutation on release.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::ElementKind;
use crate::drag::DragSession;
use crate::hit::Rect;

/// Modifier keys held when a pointer or key event fired.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Extends or toggles selection; larger nudge steps.
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on Windows/Linux or Command on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Pointer button that started a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Selects, drags, and starts marquees.
    Primary,
    /// Pans the camera.
    Middle,
    /// Ignored by the controller.
    Secondary,
}

impl Button {
    /// Map a DOM `MouseEvent.button` code.
    #[must_use]
    pub fn from_dom(code: i16) -> Self {
        match code {
            1 => Self::Middle,
            2 => Self::Secondary,
            _ => Self::Primary,
        }
    }
}

/// A keyboard key.
///
/// The inner string holds the key name as reported by the browser (e.g. `"Delete"`, `"Escape"`, `"z"`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Case-insensitive match against a key name.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }
}

/// Export targets offered by the toolbar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Pdf,
}

/// Stateless commands issued by a surface toolbar.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarCommand {
    /// Add a new element of the given kind.
    Add(ElementKind),
    ZoomIn,
    ZoomOut,
    ZoomReset,
    Undo,
    Redo,
    DeleteSelected,
    DuplicateSelected,
    Export(ExportFormat),
}

/// Internal state for the input state machine.
///
/// Each active variant carries gesture context needed to compute previews and
/// emit final actions on pointer-up.
#[derive(Debug, Clone, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// The user is panning the canvas by dragging the background.
    Panning {
        /// Previous pointer position in screen space.
        last_screen: Point,
    },
    /// The user is moving one element, or a whole selection, across the canvas.
    DraggingElements(DragSession),
    /// The user is sweeping a marquee over empty canvas.
    Marquee {
        /// Screen-space pointer position at pointer-down; decides click vs. sweep.
        start_screen: Point,
        /// Canvas-space anchor corner.
        start: Point,
        /// Canvas-space moving corner.
        current: Point,
        /// Shift was held at pointer-down: union into the selection instead of replacing.
        additive: bool,
    },
}

impl InputState {
    /// The marquee rectangle in canvas coordinates, while sweeping.
    #[must_use]
    pub fn marquee_rect(&self) -> Option<Rect> {
        match self {
            Self::Marquee { start, current, .. } => Some(Rect::from_corners(*start, *current)),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// The button that started the active gesture; only its release ends it.
    #[must_use]
    pub fn button(&self) -> Option<Button> {
        match self {
            Self::Idle => None,
            Self::Panning { .. } => Some(Button::Middle),
            Self::DraggingElements(_) | Self::Marquee { .. } => Some(Button::Primary),
        }
    }
}
