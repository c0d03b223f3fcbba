#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::Serialize;

use crate::consts::{TILE_SIZE_PX, ZOOM_MAX, ZOOM_MIN};
use crate::shape::Bounds;

/// A point in either screen space (pixels) or world space (`x` = longitude, `y` = latitude).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        self.lerp(other, 0.5)
    }

    /// Point `t` of the way from `self` toward `other`.
    #[must_use]
    pub fn lerp(self, other: Point, t: f64) -> Point {
        Point { x: self.x + (other.x - self.x) * t, y: self.y + (other.y - self.y) * t }
    }

    /// Squared planar distance, no latitude correction.
    #[must_use]
    pub fn dist_sq(self, other: Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        dx * dx + dy * dy
    }
}

/// Map camera over a lon/lat plane.
///
/// `pan_x` / `pan_y` are the screen position of lon/lat `(0, 0)` in CSS pixels.
/// `zoom` is screen pixels per degree. Screen Y grows downward while
/// latitude grows northward, so the Y axis is flipped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub pan_x: f64,
    pub pan_y: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self { pan_x: 0.0, pan_y: 0.0, zoom: 1.0 }
    }
}

impl Camera {
    /// Convert a screen-space point (CSS pixels) to lon/lat.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.pan_x) / self.zoom,
            y: -(screen.y - self.pan_y) / self.zoom,
        }
    }

    /// Convert a lon/lat point to screen coordinates (CSS pixels).
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.zoom + self.pan_x,
            y: -world.y * self.zoom + self.pan_y,
        }
    }

    /// Equivalent web-map zoom level: `2^z` tiles span the 360 degrees of longitude.
    #[must_use]
    pub fn map_zoom(&self) -> f64 {
        (self.zoom * 360.0 / TILE_SIZE_PX).log2()
    }

    /// Convert a screen-space distance (pixels) to degrees.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.zoom
    }

    /// Convert two screen corners into the lon/lat box they span.
    #[must_use]
    pub fn screen_rect_to_world(&self, a: Point, b: Point) -> Bounds {
        Bounds::from_corners(self.screen_to_world(a), self.screen_to_world(b))
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan_x += dx;
        self.pan_y += dy;
    }

    /// Multiply zoom by `factor`, keeping the world point under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64) {
        let world = self.screen_to_world(anchor);
        self.zoom = (self.zoom * factor).clamp(ZOOM_MIN, ZOOM_MAX);
        self.pan_x = anchor.x - world.x * self.zoom;
        self.pan_y = anchor.y + world.y * self.zoom;
    }

    /// Frame `bounds` inside a `width` x `height` viewport with `padding` pixels on each side.
    ///
    /// Returns `false` and leaves the camera untouched for empty bounds or a
    /// viewport with no room left after padding.
    pub fn fit_bounds(&mut self, bounds: &Bounds, width: f64, height: f64, padding: f64) -> bool {
        if bounds.is_empty() {
            return false;
        }
        let avail_w = width - 2.0 * padding;
        let avail_h = height - 2.0 * padding;
        if avail_w <= 0.0 || avail_h <= 0.0 {
            return false;
        }
        let span_w = bounds.width();
        let span_h = bounds.height();
        let zoom = match (span_w > 0.0, span_h > 0.0) {
            (true, true) => (avail_w / span_w).min(avail_h / span_h),
            (true, false) => avail_w / span_w,
            (false, true) => avail_h / span_h,
            (false, false) => self.zoom,
        };
        self.zoom = zoom.clamp(ZOOM_MIN, ZOOM_MAX);
        let center = bounds.center();
        self.pan_x = width * 0.5 - center.x * self.zoom;
        self.pan_y = height * 0.5 + center.y * self.zoom;
        true
    }
}
