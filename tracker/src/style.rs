//! Render outputs: per-feature styles, permanent labels, and the box
//! selection overlay.
//!
//! The core draws nothing itself. These functions turn read-only session
//! state into plain values the host map layer applies; nothing computed here
//! is stored back on a feature.

#[cfg(test)]
#[path = "style_test.rs"]
mod style_test;

use serde::Serialize;

use crate::camera::{Camera, Point};
use crate::connectors::Mc4Status;
use crate::consts::{LABEL_FONT_PX_AT_21, LABEL_MIN_ZOOM};
use crate::doc::{Feature, FeatureKind, Survey};
use crate::input::{InputState, PaintMode};
use crate::lengths::{LengthStatus, LengthTable};
use crate::selection::SelectionSet;

// ── Palette ─────────────────────────────────────────────────────

pub const SELECTED_MEASURED: &str = "#22c55e";
pub const SELECTED_UNMEASURED: &str = "#f59e0b";
pub const UNSELECTED: &str = "#374151";
pub const INVERTER_POINT: &str = "#ef4444";
pub const CONNECTOR_INSTALLED: &str = "#22c55e";
pub const CONNECTOR_PENDING: &str = "#ef4444";
pub const PREVIEW_ADD: &str = "#22c55e";
pub const PREVIEW_REMOVE: &str = "#ef4444";
const TRANSPARENT: &str = "transparent";

/// Background strokes cycle through these by content hash.
pub const RAINBOW: [&str; 6] = ["#FF69B4", "#FFA52C", "#FFFF41", "#008018", "#0000F9", "#86007D"];

/// Stroke and fill for one feature.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Style {
    pub color: &'static str,
    pub weight: f64,
    pub opacity: f64,
    pub fill_color: Option<&'static str>,
    pub fill_opacity: f64,
    /// Whether pointer events should reach the feature.
    pub interactive: bool,
}

/// Table style keyed by selection and measurement status.
#[must_use]
pub fn table_style(selected: bool, status: LengthStatus) -> Style {
    let color = match (selected, status) {
        (true, LengthStatus::Measured) => SELECTED_MEASURED,
        (true, LengthStatus::Unmeasured) => SELECTED_UNMEASURED,
        (false, _) => UNSELECTED,
    };
    Style {
        color,
        weight: if selected { 3.0 } else { 1.0 },
        opacity: 1.0,
        fill_color: Some(color),
        fill_opacity: if selected { 0.8 } else { 0.6 },
        interactive: true,
    }
}

/// Background stroke picked from [`RAINBOW`] by hashing the feature's
/// properties, or its coordinates when it has none.
#[must_use]
pub fn background_style(feature: &Feature) -> Style {
    let source = if feature.props.is_empty() {
        serde_json::to_string(feature.shape.points())
    } else {
        serde_json::to_string(&feature.props)
    }
    .unwrap_or_default();
    let idx = rainbow_index(string_hash(&source));
    Style {
        color: RAINBOW[idx],
        weight: 2.0,
        opacity: 0.8,
        fill_color: None,
        fill_opacity: 0.0,
        interactive: false,
    }
}

#[must_use]
pub fn inverter_point_style() -> Style {
    Style {
        color: INVERTER_POINT,
        weight: 4.0,
        opacity: 1.0,
        fill_color: None,
        fill_opacity: 0.0,
        interactive: false,
    }
}

#[must_use]
pub fn connector_style(installed: bool) -> Style {
    let color = if installed { CONNECTOR_INSTALLED } else { CONNECTOR_PENDING };
    Style {
        color,
        weight: 2.0,
        opacity: 1.0,
        fill_color: Some(color),
        fill_opacity: 1.0,
        interactive: true,
    }
}

/// Annotations draw only their label.
#[must_use]
pub fn text_style() -> Style {
    Style {
        color: TRANSPARENT,
        weight: 0.0,
        opacity: 0.0,
        fill_color: None,
        fill_opacity: 0.0,
        interactive: false,
    }
}

/// Style for any feature, dispatching on its kind.
#[must_use]
pub fn feature_style(feature: &Feature, selection: &SelectionSet, lengths: &LengthTable, mc4: &Mc4Status) -> Style {
    match feature.kind {
        FeatureKind::Table => table_style(selection.contains(&feature.id), lengths.status(&feature.id)),
        FeatureKind::Background => background_style(feature),
        FeatureKind::InverterPoint => inverter_point_style(),
        FeatureKind::Text => text_style(),
        FeatureKind::Connector => {
            let installed = feature.end.is_some_and(|end| mc4.is_installed(&feature.id, end));
            connector_style(installed)
        }
    }
}

/// `h = c + ((h << 5) - h)` over UTF-16 code units, where only the shift
/// wraps to 32 bits and the running value stays a double. Matches the colour
/// a browser map assigns to the same feature.
fn string_hash(s: &str) -> f64 {
    s.encode_utf16()
        .fold(0.0, |h, c| f64::from(c) + (f64::from(to_int32(h).wrapping_shl(5)) - h))
}

/// Two's-complement 32-bit view of an integral double; non-finite values map to zero.
#[allow(clippy::cast_possible_truncation)]
fn to_int32(x: f64) -> i32 {
    if !x.is_finite() {
        return 0;
    }
    let m = x.trunc().rem_euclid(TWO_POW_32);
    (if m >= TWO_POW_32 / 2.0 { m - TWO_POW_32 } else { m }) as i32
}

const TWO_POW_32: f64 = 4_294_967_296.0;

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
fn rainbow_index(hash: f64) -> usize {
    (hash.abs() % RAINBOW.len() as f64) as usize
}

// ── Labels ──────────────────────────────────────────────────────

/// A permanent, rotated text label anchored in world space.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub position: Point,
    /// Rotation in degrees, in `(-90, 90]`.
    pub angle: f64,
    pub font_px: f64,
}

/// Label font size at a map zoom level: 30 px at zoom 21, halving per level below.
#[must_use]
pub fn label_font_px(map_zoom: f64) -> f64 {
    LABEL_FONT_PX_AT_21 * (map_zoom - 21.0).exp2()
}

#[must_use]
pub fn labels_visible(map_zoom: f64) -> bool {
    map_zoom >= LABEL_MIN_ZOOM
}

/// Labels for every table and text annotation at the camera's zoom, or none
/// when zoomed out past the label threshold.
#[must_use]
pub fn labels(survey: &Survey, camera: &Camera) -> Vec<Label> {
    let zoom = camera.map_zoom();
    if !labels_visible(zoom) {
        return Vec::new();
    }
    let font_px = label_font_px(zoom);
    survey
        .tables()
        .iter()
        .chain(survey.text())
        .map(|f| Label { text: f.label(), position: f.shape.center(), angle: f.angle, font_px })
        .filter(|l| !l.text.is_empty())
        .collect()
}

// ── Box preview ─────────────────────────────────────────────────

/// Screen-space rectangle shown while a box gesture is in progress.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoxPreview {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub mode: PaintMode,
    pub color: &'static str,
}

/// The overlay for an in-progress box gesture, if any.
#[must_use]
pub fn box_preview(input: &InputState) -> Option<BoxPreview> {
    let InputState::Boxing { mode, start, current, .. } = input else {
        return None;
    };
    Some(BoxPreview {
        x: start.x.min(current.x),
        y: start.y.min(current.y),
        width: (current.x - start.x).abs(),
        height: (current.y - start.y).abs(),
        mode: *mode,
        color: match mode {
            PaintMode::Add => PREVIEW_ADD,
            PaintMode::Erase => PREVIEW_REMOVE,
        },
    })
}
