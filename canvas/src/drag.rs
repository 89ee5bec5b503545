//! Element drag sessions and group-move arithmetic.
//!
//! A drag captures where the pointer went down and where every dragged
//! element started, so each pointer-move is computed from a stable baseline
//! rather than accumulated frame-to-frame. Nothing here mutates the document;
//! the controller commits the result on release.

#[cfg(test)]
#[path = "drag_test.rs"]
mod drag_test;

use crate::camera::Point;
use crate::consts::CLICK_THRESHOLD_PX;
use crate::doc::{ElementId, Position};

/// Clamp `(dx, dy)` so that no position in `starts` ends up negative.
///
/// Applying the returned delta uniformly keeps relative offsets intact.
#[must_use]
pub fn clamp_group_delta<'a, I>(starts: I, dx: f64, dy: f64) -> (f64, f64)
where
    I: IntoIterator<Item = &'a Position>,
{
    let mut min_x = f64::INFINITY;
    let mut min_y = f64::INFINITY;
    for p in starts {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
    }
    if !min_x.is_finite() || !min_y.is_finite() {
        return (dx, dy);
    }
    (dx.max(-min_x), dy.max(-min_y))
}

/// Per-gesture drag context, created on pointer-down over an element.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    /// Element the pointer went down on.
    pub anchor: ElementId,
    /// Screen-space pointer position at pointer-down.
    pub start_screen: Point,
    /// Start position of every element that moves with this drag.
    pub starts: Vec<(ElementId, Position)>,
    /// Canvas-space delta as of the last pointer-move, already clamped.
    pub delta: (f64, f64),
    /// Screen-space pointer position as of the last event.
    pub last_screen: Point,
}

impl DragSession {
    #[must_use]
    pub fn new(anchor: ElementId, start_screen: Point, starts: Vec<(ElementId, Position)>) -> Self {
        Self { anchor, start_screen, starts, delta: (0.0, 0.0), last_screen: start_screen }
    }

    /// More than one element moves with this drag.
    #[must_use]
    pub fn is_group(&self) -> bool {
        self.starts.len() > 1
    }

    /// Update from a pointer-move. `scale` is the camera zoom factor.
    ///
    /// Returns the clamped canvas-space delta.
    pub fn update(&mut self, screen: Point, scale: f64) -> (f64, f64) {
        self.last_screen = screen;
        let dx = (screen.x - self.start_screen.x) / scale;
        let dy = (screen.y - self.start_screen.y) / scale;
        self.delta = clamp_group_delta(self.starts.iter().map(|(_, p)| p), dx, dy);
        self.delta
    }

    /// Whether the pointer travelled less than the click threshold (screen pixels).
    #[must_use]
    pub fn is_click(&self, end_screen: Point) -> bool {
        self.start_screen.distance(end_screen) < CLICK_THRESHOLD_PX
    }

    /// Visual position of `id` for the current delta, without committing.
    #[must_use]
    pub fn preview_position(&self, id: &str) -> Option<Position> {
        self.starts
            .iter()
            .find(|(sid, _)| sid == id)
            .map(|(_, p)| p.offset(self.delta.0, self.delta.1))
    }

    /// Final positions for every dragged element.
    #[must_use]
    pub fn final_positions(&self) -> Vec<(ElementId, Position)> {
        self.starts
            .iter()
            .map(|(id, p)| (id.clone(), p.offset(self.delta.0, self.delta.1)))
            .collect()
    }
}
