//! Derived geometry: orientation angles, closed-path promotion, connector
//! endpoints, and label snapping.
//!
//! Everything here is pure and runs once per load. Degenerate input never
//! fails: too few points yields angle `0` and no endpoints.
//!
//! Lengths use a small-angle planar approximation: longitude deltas are
//! scaled by `cos(latitude)` of the edge's first point so east-west and
//! north-south degrees are comparable. Good enough for sub-kilometre sites.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use serde::Serialize;

use crate::camera::Point;
use crate::consts::MIN_CLOSED_PATH_POINTS;
use crate::doc::Feature;
use crate::shape::{Shape, ring_edges};

/// Which end of a table a connector marker sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorEnd {
    Start,
    End,
}

impl ConnectorEnd {
    pub const ALL: [ConnectorEnd; 2] = [ConnectorEnd::Start, ConnectorEnd::End];
}

/// The two connector positions derived from a table polygon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Endpoints {
    pub start: Point,
    pub end: Point,
}

impl Endpoints {
    #[must_use]
    pub fn get(&self, end: ConnectorEnd) -> Point {
        match end {
            ConnectorEnd::Start => self.start,
            ConnectorEnd::End => self.end,
        }
    }
}

/// Fold an angle in degrees into `(-90, 90]` so label text is never upside down.
#[must_use]
pub fn fold_angle(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let mut a = deg % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    if a > 90.0 {
        a -= 180.0;
    } else if a <= -90.0 {
        a += 180.0;
    }
    a
}

/// Squared edge length with longitude compressed by `cos(latitude)`.
#[must_use]
pub fn adjusted_len_sq(a: Point, b: Point) -> f64 {
    let (dx, dy) = adjusted_delta(a, b);
    dx * dx + dy * dy
}

fn adjusted_delta(a: Point, b: Point) -> (f64, f64) {
    let dx = (b.x - a.x) * a.y.to_radians().cos();
    let dy = b.y - a.y;
    (dx, dy)
}

/// Screen rotation in degrees of the longest edge of `points`, folded into `(-90, 90]`.
///
/// The sign is flipped relative to the math angle because screen Y points
/// down while latitude points up. Fewer than two points yields `0`.
#[must_use]
pub fn orientation_angle(points: &[Point]) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let mut best = (points[0], points[1]);
    let mut best_len = 0.0;
    for w in points.windows(2) {
        let len = adjusted_len_sq(w[0], w[1]);
        if len > best_len {
            best_len = len;
            best = (w[0], w[1]);
        }
    }
    let (dx, dy) = adjusted_delta(best.0, best.1);
    fold_angle(-dy.atan2(dx).to_degrees())
}

/// Reclassify an open path whose first and last points coincide as an area.
///
/// Needs at least four points (a triangle plus its closing point). Anything
/// else is returned unchanged.
#[must_use]
pub fn promote_closed_path(shape: Shape) -> Shape {
    match shape {
        Shape::Path(pts) if pts.len() >= MIN_CLOSED_PATH_POINTS && pts.first() == pts.last() => Shape::Area(pts),
        other => other,
    }
}

/// Derive the two connector positions of a table ring.
///
/// Takes the two shortest non-degenerate edges (the short sides of a
/// rectangular table), then pulls each edge midpoint `inset` of the way
/// toward the center between the two midpoints so the markers sit inside the
/// polygon. `start` is the edge that comes first in ring order.
///
/// Returns `None` when the ring has fewer than two usable edges.
#[must_use]
pub fn derive_endpoints(ring: &[Point], inset: f64) -> Option<Endpoints> {
    let mut edges: Vec<(usize, f64, Point, Point)> = ring_edges(ring)
        .enumerate()
        .map(|(i, (a, b))| (i, adjusted_len_sq(a, b), a, b))
        .filter(|(_, len, _, _)| *len > 0.0)
        .collect();
    if edges.len() < 2 {
        return None;
    }
    edges.sort_by(|x, y| x.1.total_cmp(&y.1).then(x.0.cmp(&y.0)));
    let (mut first, mut second) = (edges[0], edges[1]);
    if second.0 < first.0 {
        std::mem::swap(&mut first, &mut second);
    }

    let m1 = first.2.midpoint(first.3);
    let m2 = second.2.midpoint(second.3);
    let center = m1.midpoint(m2);
    Some(Endpoints { start: m1.lerp(center, inset), end: m2.lerp(center, inset) })
}

/// Where a text annotation at `position` should be placed, if a reference
/// feature is close enough.
///
/// Finds the reference whose center is nearest by squared planar distance.
/// When that distance is below `threshold_deg` squared, returns the
/// reference center and its orientation angle.
#[must_use]
pub fn snap_label(position: Point, references: &[Feature], threshold_deg: f64) -> Option<(Point, f64)> {
    let mut best: Option<(f64, &Feature, Point)> = None;
    for feature in references {
        let center = feature.shape.center();
        let d = center.dist_sq(position);
        if best.as_ref().is_none_or(|(best_d, _, _)| d < *best_d) {
            best = Some((d, feature, center));
        }
    }
    let (dist_sq, feature, center) = best?;
    if dist_sq < threshold_deg * threshold_deg {
        Some((center, orientation_angle(feature.shape.points())))
    } else {
        None
    }
}
