//! Core of the cable-pulling progress tracker for solar-farm DC cabling.
//!
//! The crate owns everything between the host map layer and the operator's
//! progress numbers: loading survey geometry, deriving label angles and
//! connector positions, turning raw pointer and keyboard events into
//! selection changes, keeping undo history, and aggregating measured cable
//! lengths. The host is responsible only for drawing what [`style`] describes
//! and forwarding input events to an [`engine::Session`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Per-operator [`engine::Session`] and the input dispatch |
//! | [`doc`] | Survey features, typed properties, and GeoJSON loading |
//! | [`shape`] | Point/path/area geometry and bounding boxes |
//! | [`geometry`] | Label orientation, connector endpoints, label snapping |
//! | [`ident`] | Identifier normalization and group membership |
//! | [`lengths`] | Per-table plus/minus cable lengths from tabular input |
//! | [`selection`] | Selected set with bounded undo/redo history |
//! | [`progress`] | DC and MC4 totals, percentages, daily records |
//! | [`connectors`] | MC4 connector installation status |
//! | [`camera`] | Pan/zoom camera and coordinate conversions |
//! | [`input`] | Input event types and the gesture state machine |
//! | [`hit`] | Hit-testing tables and connector markers |
//! | [`style`] | Feature styles, permanent labels, and the box overlay |
//! | [`observe`] | Change notifications with scoped subscriptions |
//! | [`config`] | Tunable thresholds read from the environment |
//! | [`consts`] | Shared numeric constants |

pub mod camera;
pub mod config;
pub mod connectors;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod geometry;
pub mod hit;
pub mod ident;
pub mod input;
pub mod lengths;
pub mod observe;
pub mod progress;
pub mod selection;
pub mod shape;
pub mod style;
