//! Shared numeric constants for the tracker crate.

// ── Geometry ────────────────────────────────────────────────────

/// Fraction of the way each connector midpoint is pulled toward the other.
pub const CONNECTOR_INSET: f64 = 0.2;

/// Label snapping distance in degrees (roughly 10 m at survey latitudes).
/// Compared against the squared planar distance after squaring.
pub const SNAP_THRESHOLD_DEG: f64 = 0.001;

/// Minimum point count for an open path to be considered for promotion to an area.
pub const MIN_CLOSED_PATH_POINTS: usize = 4;

// ── Gestures ────────────────────────────────────────────────────

/// Pointer travel in screen pixels that turns a press into a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Window after a box release during which clicks are ignored, in milliseconds.
pub const CLICK_SUPPRESS_MS: f64 = 50.0;

/// Maximum number of selection snapshots kept in the undo history.
pub const HISTORY_LIMIT: usize = 500;

// ── Hit-testing ─────────────────────────────────────────────────

/// Screen-space hit slop in pixels for thin paths and connector markers.
pub const HIT_SLOP_PX: f64 = 8.0;

// ── Camera ──────────────────────────────────────────────────────

/// Padding around the data extent when fitting the camera, in pixels.
pub const FIT_PADDING_PX: f64 = 40.0;

/// Zoom limits in screen pixels per degree.
pub const ZOOM_MIN: f64 = 1.0;
pub const ZOOM_MAX: f64 = 1.0e9;

/// Web-map tile edge in pixels; relates pixels per degree to map zoom levels.
pub const TILE_SIZE_PX: f64 = 256.0;

/// Zoom factor applied per 100 px of wheel delta.
pub const WHEEL_ZOOM_STEP: f64 = 1.25;

// ── Labels ──────────────────────────────────────────────────────

/// Label font size in pixels at map zoom 21; doubles per zoom level above.
pub const LABEL_FONT_PX_AT_21: f64 = 30.0;

/// Map zoom level below which permanent labels are hidden.
pub const LABEL_MIN_ZOOM: f64 = 17.0;
