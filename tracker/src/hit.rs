#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Camera, Point};
use crate::doc::{Feature, Survey};
use crate::geometry::ConnectorEnd;

/// Which part of the survey was hit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Hit {
    Table(String),
    Connector { id: String, end: ConnectorEnd },
}

/// Test what is under `screen_pt`, checking connector markers first when
/// `connectors` is set. `slop_px` widens thin paths and markers.
#[must_use]
pub fn hit_test(screen_pt: Point, survey: &Survey, camera: &Camera, slop_px: f64, connectors: bool) -> Option<Hit> {
    let world = camera.screen_to_world(screen_pt);
    let tolerance = camera.screen_dist_to_world(slop_px);
    if connectors {
        if let Some((id, end)) = hit_connector(world, survey.connectors(), tolerance) {
            return Some(Hit::Connector { id: id.to_string(), end });
        }
    }
    hit_table(world, survey.tables(), tolerance).map(|f| Hit::Table(f.id.clone()))
}

/// The top-most (last drawn) selectable table at `world`.
///
/// Areas hit by point-in-polygon; paths and points within `tolerance` degrees.
#[must_use]
pub fn hit_table(world: Point, tables: &[Feature], tolerance: f64) -> Option<&Feature> {
    tables.iter().rev().find(|f| f.is_selectable() && f.shape.contains_point(world, tolerance))
}

/// The connector marker nearest to `world`, if within `tolerance` degrees.
#[must_use]
pub fn hit_connector(world: Point, connectors: &[Feature], tolerance: f64) -> Option<(&str, ConnectorEnd)> {
    let limit = tolerance * tolerance;
    connectors
        .iter()
        .filter(|f| !f.id.is_empty())
        .filter_map(|f| {
            let end = f.end?;
            let d = f.shape.center().dist_sq(world);
            (d <= limit).then_some((d, f.id.as_str(), end))
        })
        .min_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, id, end)| (id, end))
}
