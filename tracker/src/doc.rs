//! Survey model: features, their kinds and properties, and the loaded survey.
//!
//! This module defines the data types that describe what is on the map
//! (`Feature`, `FeatureKind`), a typed accessor for the open-ended
//! `properties` bag (`Props`), and the read-only store built at load time
//! (`Survey`).
//!
//! Data flows into this layer as GeoJSON text. Loading normalizes ids and
//! runs the derivations in [`crate::geometry`] exactly once; after that every
//! feature is immutable until the next load.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::camera::Point;
use crate::config::TrackerConfig;
use crate::geometry::{self, ConnectorEnd, Endpoints};
use crate::ident;
use crate::shape::{Bounds, Shape};

/// Label priority for free-floating annotations, first present wins.
const LABEL_FIELDS: [&str; 6] = ["Text", "text", "Name", "name", "string_id", "id"];

/// Stored rotation priority for annotations.
const ROTATION_FIELDS: [&str; 2] = ["Rotation", "angle"];

/// Identifier priority for tables.
const ID_FIELDS: [&str; 2] = ["string_id", "text"];

/// Label shown on tables whose id normalizes to nothing.
pub const MISSING_ID_LABEL: &str = "No ID";

/// The kind of a survey feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FeatureKind {
    /// Selectable cable-pulling table.
    Table,
    /// Non-interactive drawing context.
    Background,
    /// Free-floating text annotation.
    Text,
    /// Connector marker synthesized from a table.
    Connector,
    /// Reference geometry that text annotations snap to.
    InverterPoint,
}

/// Which input collection a feature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
    Tables,
    Background,
    Text,
    InverterPoints,
}

impl Layer {
    fn kind(self) -> FeatureKind {
        match self {
            Self::Tables => FeatureKind::Table,
            Self::Background => FeatureKind::Background,
            Self::Text => FeatureKind::Text,
            Self::InverterPoints => FeatureKind::InverterPoint,
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Tables => "tables",
            Self::Background => "background",
            Self::Text => "text",
            Self::InverterPoints => "inverter points",
        };
        f.write_str(name)
    }
}

/// Error returned by [`Survey::load`]. Nothing is loaded when any layer fails.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("{layer} layer is not a valid feature collection: {source}")]
    Json {
        layer: Layer,
        #[source]
        source: serde_json::Error,
    },
    #[error("{layer} layer feature {index} has a position with fewer than two coordinates")]
    BadPosition { layer: Layer, index: usize },
}

/// One surveyed element after load-time derivation.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Normalized id. Not unique across features.
    pub id: String,
    pub kind: FeatureKind,
    pub shape: Shape,
    /// Label rotation in degrees, in `(-90, 90]`.
    pub angle: f64,
    /// Connector positions, tables only.
    pub endpoints: Option<Endpoints>,
    /// Which end this marker represents, connectors only.
    pub end: Option<ConnectorEnd>,
    pub props: Map<String, Value>,
}

impl Feature {
    /// Build a feature and derive its angle (and endpoints for tables).
    #[must_use]
    pub fn new(id: String, kind: FeatureKind, shape: Shape, props: Map<String, Value>, config: &TrackerConfig) -> Self {
        let shape = geometry::promote_closed_path(shape);
        let angle = geometry::orientation_angle(shape.points());
        let endpoints = match (&shape, kind) {
            (Shape::Area(ring), FeatureKind::Table) => geometry::derive_endpoints(ring, config.connector_inset),
            _ => None,
        };
        Self { id, kind, shape, angle, endpoints, end: None, props }
    }

    /// Typed view over `props`.
    #[must_use]
    pub fn props(&self) -> Props<'_> {
        Props::new(&self.props)
    }

    /// Whether region and pointer gestures can pick this feature.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        self.kind == FeatureKind::Table && !self.id.is_empty()
    }

    /// Display text for the feature's permanent label.
    #[must_use]
    pub fn label(&self) -> String {
        match self.kind {
            FeatureKind::Text => self.props().label_text(),
            _ if self.id.is_empty() => MISSING_ID_LABEL.to_string(),
            _ => self.id.clone(),
        }
    }
}

/// Typed access to the common fields of a feature's `properties` object.
pub struct Props<'a> {
    value: &'a Map<String, Value>,
}

impl<'a> Props<'a> {
    #[must_use]
    pub fn new(value: &'a Map<String, Value>) -> Self {
        Self { value }
    }

    /// Raw identifier: `string_id`, falling back to `text`. Numbers are stringified.
    #[must_use]
    pub fn raw_id(&self) -> Option<String> {
        self.first_text(&ID_FIELDS)
    }

    /// Annotation label: `Text`, `text`, `Name`, `name`, `string_id`, `id`.
    /// Empty string when none is present.
    #[must_use]
    pub fn label_text(&self) -> String {
        self.first_text(&LABEL_FIELDS).unwrap_or_default()
    }

    /// Stored annotation rotation: `Rotation`, then `angle`. Defaults to `0`.
    #[must_use]
    pub fn stored_rotation(&self) -> f64 {
        ROTATION_FIELDS
            .iter()
            .filter_map(|key| self.value.get(*key))
            .find_map(|v| match v {
                Value::Number(n) => n.as_f64(),
                Value::String(s) => match s.trim().parse::<f64>() {
                    Ok(v) => Some(v),
                    Err(err) => {
                        warn!(value = %s, error = %err, "unparseable rotation; trying next field");
                        None
                    }
                },
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// First non-empty string or number among `keys`.
    fn first_text(&self, keys: &[&str]) -> Option<String> {
        keys.iter().filter_map(|key| self.value.get(*key)).find_map(|v| match v {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Raw GeoJSON text for each layer. Only `tables` is required.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurveySources<'a> {
    pub tables: &'a str,
    pub background: Option<&'a str>,
    pub text: Option<&'a str>,
    pub inverter_points: Option<&'a str>,
}

/// All features of one load, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Survey {
    tables: Vec<Feature>,
    background: Vec<Feature>,
    text: Vec<Feature>,
    inverter_points: Vec<Feature>,
    connectors: Vec<Feature>,
}

impl Survey {
    /// Parse every layer and run load-time derivation.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] when any layer is not a feature collection, has
    /// an unsupported geometry type, or has a malformed position.
    pub fn load(sources: &SurveySources<'_>, config: &TrackerConfig) -> Result<Self, LoadError> {
        let tables = parse_layer(Layer::Tables, sources.tables, config)?;
        let background = parse_optional(Layer::Background, sources.background, config)?;
        let raw_text = parse_optional(Layer::Text, sources.text, config)?;
        let inverter_points = parse_optional(Layer::InverterPoints, sources.inverter_points, config)?;

        let survey = Self::from_features(tables, background, raw_text, inverter_points, config);
        info!(
            tables = survey.tables.len(),
            background = survey.background.len(),
            text = survey.text.len(),
            inverter_points = survey.inverter_points.len(),
            connectors = survey.connectors.len(),
            "survey loaded"
        );
        Ok(survey)
    }

    /// Assemble a survey from already-built features: snaps annotations to
    /// the nearest inverter point and synthesizes connector markers.
    #[must_use]
    pub fn from_features(
        tables: Vec<Feature>,
        background: Vec<Feature>,
        text: Vec<Feature>,
        inverter_points: Vec<Feature>,
        config: &TrackerConfig,
    ) -> Self {
        let text = text
            .into_iter()
            .map(|f| snap_annotation(f, &inverter_points, config.snap_threshold_deg))
            .collect();
        let connectors = tables.iter().flat_map(connector_features).collect();
        Self { tables, background, text, inverter_points, connectors }
    }

    #[must_use]
    pub fn tables(&self) -> &[Feature] {
        &self.tables
    }

    #[must_use]
    pub fn background(&self) -> &[Feature] {
        &self.background
    }

    #[must_use]
    pub fn text(&self) -> &[Feature] {
        &self.text
    }

    #[must_use]
    pub fn inverter_points(&self) -> &[Feature] {
        &self.inverter_points
    }

    #[must_use]
    pub fn connectors(&self) -> &[Feature] {
        &self.connectors
    }

    /// Distinct selectable table ids, sorted.
    #[must_use]
    pub fn table_ids(&self) -> BTreeSet<String> {
        self.tables
            .iter()
            .filter(|f| f.is_selectable())
            .map(|f| f.id.clone())
            .collect()
    }

    /// Extent of the tables layer; the camera fits to this.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        let mut b = Bounds::default();
        for f in &self.tables {
            b.union(&f.shape.bounds());
        }
        b
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

fn snap_annotation(mut feature: Feature, references: &[Feature], threshold_deg: f64) -> Feature {
    feature.angle = geometry::fold_angle(feature.props().stored_rotation());
    if let Some((center, angle)) = geometry::snap_label(feature.shape.center(), references, threshold_deg) {
        feature.shape = Shape::Point(center);
        feature.angle = angle;
    }
    feature
}

fn connector_features(table: &Feature) -> Vec<Feature> {
    let Some(endpoints) = table.endpoints else {
        return Vec::new();
    };
    ConnectorEnd::ALL
        .into_iter()
        .map(|end| Feature {
            id: table.id.clone(),
            kind: FeatureKind::Connector,
            shape: Shape::Point(endpoints.get(end)),
            angle: table.angle,
            endpoints: None,
            end: Some(end),
            props: Map::new(),
        })
        .collect()
}

// =============================================================
// GeoJSON parsing
// =============================================================

#[derive(Deserialize)]
struct RawCollection {
    features: Vec<RawFeature>,
}

#[derive(Deserialize)]
struct RawFeature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    #[serde(default)]
    geometry: Option<RawGeometry>,
}

#[derive(Deserialize)]
#[serde(tag = "type", content = "coordinates")]
enum RawGeometry {
    Point(Vec<f64>),
    LineString(Vec<Vec<f64>>),
    MultiLineString(Vec<Vec<Vec<f64>>>),
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

fn parse_optional(layer: Layer, text: Option<&str>, config: &TrackerConfig) -> Result<Vec<Feature>, LoadError> {
    match text {
        Some(text) => parse_layer(layer, text, config),
        None => Ok(Vec::new()),
    }
}

fn parse_layer(layer: Layer, text: &str, config: &TrackerConfig) -> Result<Vec<Feature>, LoadError> {
    let raw: RawCollection = serde_json::from_str(text).map_err(|source| LoadError::Json { layer, source })?;
    let mut features = Vec::with_capacity(raw.features.len());
    for (index, raw_feature) in raw.features.into_iter().enumerate() {
        let Some(geometry) = raw_feature.geometry else {
            warn!(%layer, index, "feature has no geometry; skipping");
            continue;
        };
        let shape = to_shape(geometry).ok_or(LoadError::BadPosition { layer, index })?;
        let props = raw_feature.properties.unwrap_or_default();
        let id = ident::normalize_opt(Props::new(&props).raw_id().as_deref());
        features.push(Feature::new(id, layer.kind(), shape, props, config));
    }
    Ok(features)
}

fn to_shape(geometry: RawGeometry) -> Option<Shape> {
    match geometry {
        RawGeometry::Point(pos) => to_point(&pos).map(Shape::Point),
        RawGeometry::LineString(line) => to_points(&line).map(Shape::Path),
        RawGeometry::MultiLineString(lines) => to_points(lines.first().map_or(&[][..], Vec::as_slice)).map(Shape::Path),
        RawGeometry::Polygon(rings) => to_points(rings.first().map_or(&[][..], Vec::as_slice)).map(Shape::Area),
        RawGeometry::MultiPolygon(polys) => {
            let ring = polys.first().and_then(|rings| rings.first());
            to_points(ring.map_or(&[][..], Vec::as_slice)).map(Shape::Area)
        }
    }
}

fn to_points(positions: &[Vec<f64>]) -> Option<Vec<Point>> {
    positions.iter().map(|p| to_point(p)).collect()
}

fn to_point(pos: &[f64]) -> Option<Point> {
    match pos {
        [x, y, ..] => Some(Point::new(*x, *y)),
        _ => None,
    }
}
