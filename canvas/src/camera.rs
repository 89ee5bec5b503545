#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    CANVAS_ORIGIN_OFFSET_PX, ZOOM_DEFAULT_PERCENT, ZOOM_MAX_PERCENT, ZOOM_MIN_PERCENT, ZOOM_STEP_PERCENT,
};

/// A point in either screen or canvas space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Convert a client-space pointer position to canvas coordinates.
///
/// `zoom_percent` is the surface zoom (100 = 1:1). `origin_offset` is the
/// padding between the surface's client origin and canvas (0, 0).
#[must_use]
pub fn screen_to_canvas(point: Point, zoom_percent: f64, pan: Point, origin_offset: Point) -> Point {
    let scale = zoom_percent / 100.0;
    Point {
        x: (point.x - origin_offset.x - pan.x) / scale,
        y: (point.y - origin_offset.y - pan.y) / scale,
    }
}

/// Inverse of [`screen_to_canvas`].
#[must_use]
pub fn canvas_to_screen(point: Point, zoom_percent: f64, pan: Point, origin_offset: Point) -> Point {
    let scale = zoom_percent / 100.0;
    Point {
        x: point.x * scale + pan.x + origin_offset.x,
        y: point.y * scale + pan.y + origin_offset.y,
    }
}

/// Camera state for pan/zoom on a canvas surface.
///
/// `pan_x` / `pan_y` are in CSS pixels.
/// `zoom` is a percentage (100.0 = no zoom), kept within the configured bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
    pub origin: Point,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            pan_x: 0.0,
            pan_y: 0.0,
            zoom: ZOOM_DEFAULT_PERCENT,
            origin: Point::new(CANVAS_ORIGIN_OFFSET_PX, CANVAS_ORIGIN_OFFSET_PX),
        }
    }
}

impl Camera {
    #[must_use]
    pub fn pan(&self) -> Point {
        Point::new(self.pan_x, self.pan_y)
    }

    /// Zoom as a scale factor (1.0 = no zoom).
    #[must_use]
    pub fn scale(&self) -> f64 {
        self.zoom / 100.0
    }

    /// Convert a screen-space point (CSS pixels) to canvas coordinates.
    #[must_use]
    pub fn screen_to_canvas(&self, screen: Point) -> Point {
        screen_to_canvas(screen, self.zoom, self.pan(), self.origin)
    }

    /// Convert a canvas-space point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn canvas_to_screen(&self, canvas: Point) -> Point {
        canvas_to_screen(canvas, self.zoom, self.pan(), self.origin)
    }

    /// Convert a screen-space distance (pixels) to canvas-space distance.
    #[must_use]
    pub fn screen_dist_to_canvas(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale()
    }

    /// Set the zoom percentage, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom_percent: f64) {
        self.zoom = zoom_percent.clamp(ZOOM_MIN_PERCENT, ZOOM_MAX_PERCENT);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.zoom + ZOOM_STEP_PERCENT);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.zoom - ZOOM_STEP_PERCENT);
    }

    /// Restore 100% zoom and clear the pan offset.
    pub fn reset(&mut self) {
        self.zoom = ZOOM_DEFAULT_PERCENT;
        self.pan_x = 0.0;
        self.pan_y = 0.0;
    }

    /// Shift the pan offset by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }
}
