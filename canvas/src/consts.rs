//! Shared numeric constants for the canvas crate.

// ── Pointer gestures ────────────────────────────────────────────

/// Pointer travel (screen pixels) below which a drag is treated as a click.
pub const CLICK_THRESHOLD_PX: f64 = 5.0;

/// A marquee narrower AND shorter than this (screen pixels) is a background click.
pub const MARQUEE_MIN_PX: f64 = 5.0;

/// Arrow-key nudge distance in canvas units.
pub const NUDGE_STEP: f64 = 1.0;

/// Arrow-key nudge distance with shift held.
pub const NUDGE_STEP_LARGE: f64 = 10.0;

/// Offset applied to duplicated elements and to cascaded new elements.
pub const CASCADE_OFFSET: f64 = 20.0;

// ── History ─────────────────────────────────────────────────────

/// Maximum number of snapshots retained by the undo/redo history.
pub const HISTORY_CAP: usize = 50;

// ── Camera ──────────────────────────────────────────────────────

/// Default zoom, in percent.
pub const ZOOM_DEFAULT_PERCENT: f64 = 100.0;

/// Lower zoom bound, in percent.
pub const ZOOM_MIN_PERCENT: f64 = 25.0;

/// Upper zoom bound, in percent.
pub const ZOOM_MAX_PERCENT: f64 = 300.0;

/// Toolbar zoom step, in percent.
pub const ZOOM_STEP_PERCENT: f64 = 10.0;

/// Padding between the surface's client origin and canvas-space (0, 0).
pub const CANVAS_ORIGIN_OFFSET_PX: f64 = 32.0;

// ── Hexagons ────────────────────────────────────────────────────

/// Width of the canonical flat-top hexagon.
pub const HEX_BASE_WIDTH: f64 = 140.0;

/// Height of the canonical flat-top hexagon.
pub const HEX_BASE_HEIGHT: f64 = 121.0;

// ── Default element sizes (width, height) ───────────────────────

pub const TEXT_SIZE: (f64, f64) = (200.0, 40.0);
pub const STICKY_SIZE: (f64, f64) = (200.0, 200.0);
pub const SHAPE_SIZE: (f64, f64) = (160.0, 100.0);
pub const CONNECTOR_SIZE: (f64, f64) = (160.0, 2.0);
pub const IMAGE_SIZE: (f64, f64) = (240.0, 180.0);
pub const GROUP_SIZE: (f64, f64) = (400.0, 300.0);
pub const BMC_SIZE: (f64, f64) = (1200.0, 800.0);
pub const STORY_SIZE: (f64, f64) = (260.0, 180.0);
