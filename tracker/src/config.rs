//! Tunable parameters parsed from environment variables.
//!
//! The snapping threshold and connector inset are empirically chosen; they
//! live here rather than as hard invariants so a site can retune them.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use crate::consts::{CLICK_SUPPRESS_MS, CONNECTOR_INSET, DRAG_THRESHOLD_PX, HISTORY_LIMIT, HIT_SLOP_PX, SNAP_THRESHOLD_DEG};

/// Error returned by [`TrackerConfig::validate`] and [`TrackerConfig::from_env`].
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("connector inset must be in [0, 1), got {0}")]
    InsetOutOfRange(f64),
    #[error("history limit must be at least 1")]
    ZeroHistoryLimit,
    #[error("{name} must be a finite non-negative number, got {value}")]
    NegativeThreshold { name: &'static str, value: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Label snapping distance in degrees.
    pub snap_threshold_deg: f64,
    /// Fraction of the inward pull applied to connector midpoints.
    pub connector_inset: f64,
    /// Pointer travel in pixels separating a click from a drag.
    pub drag_threshold_px: f64,
    /// Click suppression window after a box release.
    pub click_suppress_ms: f64,
    /// Maximum number of retained selection snapshots.
    pub history_limit: usize,
    /// Hit slop for paths and connector markers.
    pub hit_slop_px: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            snap_threshold_deg: SNAP_THRESHOLD_DEG,
            connector_inset: CONNECTOR_INSET,
            drag_threshold_px: DRAG_THRESHOLD_PX,
            click_suppress_ms: CLICK_SUPPRESS_MS,
            history_limit: HISTORY_LIMIT,
            hit_slop_px: HIT_SLOP_PX,
        }
    }
}

impl TrackerConfig {
    /// Build config from environment variables, falling back to defaults.
    ///
    /// Optional:
    /// - `TRACKER_SNAP_THRESHOLD_DEG`: default 0.001
    /// - `TRACKER_CONNECTOR_INSET`: default 0.2
    /// - `TRACKER_DRAG_THRESHOLD_PX`: default 5
    /// - `TRACKER_CLICK_SUPPRESS_MS`: default 50
    /// - `TRACKER_HISTORY_LIMIT`: default 500
    /// - `TRACKER_HIT_SLOP_PX`: default 8
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a value parses but is out of range.
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Self {
            snap_threshold_deg: env_parse("TRACKER_SNAP_THRESHOLD_DEG", SNAP_THRESHOLD_DEG),
            connector_inset: env_parse("TRACKER_CONNECTOR_INSET", CONNECTOR_INSET),
            drag_threshold_px: env_parse("TRACKER_DRAG_THRESHOLD_PX", DRAG_THRESHOLD_PX),
            click_suppress_ms: env_parse("TRACKER_CLICK_SUPPRESS_MS", CLICK_SUPPRESS_MS),
            history_limit: env_parse("TRACKER_HISTORY_LIMIT", HISTORY_LIMIT),
            hit_slop_px: env_parse("TRACKER_HIT_SLOP_PX", HIT_SLOP_PX),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that every value is within its usable range.
    ///
    /// # Errors
    ///
    /// Returns the first out-of-range value found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..1.0).contains(&self.connector_inset) {
            return Err(ConfigError::InsetOutOfRange(self.connector_inset));
        }
        if self.history_limit == 0 {
            return Err(ConfigError::ZeroHistoryLimit);
        }
        let thresholds = [
            ("snap_threshold_deg", self.snap_threshold_deg),
            ("drag_threshold_px", self.drag_threshold_px),
            ("click_suppress_ms", self.click_suppress_ms),
            ("hit_slop_px", self.hit_slop_px),
        ];
        for (name, value) in thresholds {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::NegativeThreshold { name, value });
            }
        }
        Ok(())
    }
}

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}
