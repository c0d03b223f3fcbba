//! Planar shape primitives: bounding boxes, feature shapes, and the
//! intersection predicates used by region selection and hit-testing.
//!
//! All math is plain planar arithmetic on lon/lat degrees. Survey areas are
//! small enough that no projection is applied here; the latitude correction
//! for angles and edge lengths lives in [`crate::geometry`].

#[cfg(test)]
#[path = "shape_test.rs"]
mod shape_test;

use serde::Serialize;

use crate::camera::Point;

/// Axis-aligned bounding box. The default value is empty and absorbs the
/// first point passed to [`Bounds::extend`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        }
    }
}

impl Bounds {
    /// The box spanned by two opposite corners, in any order.
    #[must_use]
    pub fn from_corners(a: Point, b: Point) -> Self {
        Self {
            min_x: a.x.min(b.x),
            min_y: a.y.min(b.y),
            max_x: a.x.max(b.x),
            max_y: a.y.max(b.y),
        }
    }

    /// The tightest box around `points`; empty for an empty slice.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Self {
        let mut b = Self::default();
        for p in points {
            b.extend(*p);
        }
        b
    }

    pub fn extend(&mut self, p: Point) {
        self.min_x = self.min_x.min(p.x);
        self.min_y = self.min_y.min(p.y);
        self.max_x = self.max_x.max(p.x);
        self.max_y = self.max_y.max(p.y);
    }

    /// Grow to cover `other` as well.
    pub fn union(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.extend(Point::new(other.min_x, other.min_y));
        self.extend(Point::new(other.max_x, other.max_y));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    #[must_use]
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    #[must_use]
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Inclusive containment.
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x && p.x <= self.max_x && p.y >= self.min_y && p.y <= self.max_y
    }

    /// Inclusive overlap; touching edges count.
    #[must_use]
    pub fn intersects(&self, other: &Bounds) -> bool {
        !self.is_empty()
            && !other.is_empty()
            && self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Corners in ring order starting at the south-west.
    #[must_use]
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}

/// Feature geometry after loading.
///
/// `Area` holds the outer ring only, as stored in the source (the closing
/// point may or may not repeat the first).
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point(Point),
    Path(Vec<Point>),
    Area(Vec<Point>),
}

impl Shape {
    /// The coordinate sequence: one point, the path, or the outer ring.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        match self {
            Self::Point(p) => std::slice::from_ref(p),
            Self::Path(pts) | Self::Area(pts) => pts,
        }
    }

    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::from_points(self.points())
    }

    /// Bounding-box center; the anchor for labels and snapping.
    #[must_use]
    pub fn center(&self) -> Point {
        match self {
            Self::Point(p) => *p,
            Self::Path(_) | Self::Area(_) => self.bounds().center(),
        }
    }

    /// True geometric intersection with an axis-aligned box.
    ///
    /// Partially covered shapes count. A box lying entirely inside an area
    /// also counts.
    #[must_use]
    pub fn intersects_rect(&self, rect: &Bounds) -> bool {
        if rect.is_empty() || !self.bounds().intersects(rect) {
            return false;
        }
        match self {
            Self::Point(p) => rect.contains(*p),
            Self::Path(pts) => match pts.as_slice() {
                [] => false,
                [only] => rect.contains(*only),
                _ => pts.windows(2).any(|w| segment_intersects_rect(w[0], w[1], rect)),
            },
            Self::Area(ring) => {
                ring.iter().any(|p| rect.contains(*p))
                    || rect.corners().iter().any(|c| point_in_ring(*c, ring))
                    || ring_edges(ring).any(|(a, b)| segment_intersects_rect(a, b, rect))
            }
        }
    }

    /// Whether a world point falls on this shape: inside an area, or within
    /// `tolerance` degrees of a path or point.
    #[must_use]
    pub fn contains_point(&self, p: Point, tolerance: f64) -> bool {
        let tol_sq = tolerance * tolerance;
        match self {
            Self::Point(q) => q.dist_sq(p) <= tol_sq,
            Self::Path(pts) => match pts.as_slice() {
                [] => false,
                [only] => only.dist_sq(p) <= tol_sq,
                _ => pts.windows(2).any(|w| segment_dist_sq(p, w[0], w[1]) <= tol_sq),
            },
            Self::Area(ring) => point_in_ring(p, ring),
        }
    }
}

/// Ring edges including the implicit closing edge when the ring is not
/// explicitly closed.
pub fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    let closing = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() > 2 && first != last => Some((*last, *first)),
        _ => None,
    };
    ring.windows(2).map(|w| (w[0], w[1])).chain(closing)
}

/// Even-odd ray casting. Points exactly on an edge may land on either side.
#[must_use]
pub fn point_in_ring(p: Point, ring: &[Point]) -> bool {
    if ring.len() < 3 {
        return false;
    }
    let mut inside = false;
    for (a, b) in ring_edges(ring) {
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = a.x + (p.y - a.y) * (b.x - a.x) / (b.y - a.y);
            if p.x < x_cross {
                inside = !inside;
            }
        }
    }
    inside
}

/// Whether segment `a`-`b` touches or crosses `rect`.
#[must_use]
pub fn segment_intersects_rect(a: Point, b: Point, rect: &Bounds) -> bool {
    if rect.contains(a) || rect.contains(b) {
        return true;
    }
    let c = rect.corners();
    (0..4).any(|i| segments_intersect(a, b, c[i], c[(i + 1) % 4]))
}

/// Inclusive segment intersection, collinear overlaps included.
#[must_use]
pub fn segments_intersect(p1: Point, p2: Point, q1: Point, q2: Point) -> bool {
    let d1 = cross(q1, q2, p1);
    let d2 = cross(q1, q2, p2);
    let d3 = cross(p1, p2, q1);
    let d4 = cross(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0)) && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0)) {
        return true;
    }
    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}

/// Squared distance from `p` to segment `a`-`b`.
#[must_use]
pub fn segment_dist_sq(p: Point, a: Point, b: Point) -> f64 {
    let len_sq = a.dist_sq(b);
    if len_sq == 0.0 {
        return p.dist_sq(a);
    }
    let t = (((p.x - a.x) * (b.x - a.x) + (p.y - a.y) * (b.y - a.y)) / len_sq).clamp(0.0, 1.0);
    p.dist_sq(a.lerp(b, t))
}

fn cross(o: Point, a: Point, b: Point) -> f64 {
    (a.x - o.x) * (b.y - o.y) - (a.y - o.y) * (b.x - o.x)
}

fn on_segment(a: Point, b: Point, p: Point) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}
