//! MC4 connector status: one installed flag per `(table id, end)`.
//!
//! Independent of the table selection; toggled only by connector clicks.
//! Absent keys mean "pending".

#[cfg(test)]
#[path = "connectors_test.rs"]
mod connectors_test;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::geometry::ConnectorEnd;

/// Installed / total connector counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConnectorStats {
    pub installed: usize,
    /// Two per table.
    pub total: usize,
}

impl ConnectorStats {
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.total.saturating_sub(self.installed)
    }
}

/// Installed flags keyed by table id and end.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mc4Status {
    installed: BTreeMap<(String, ConnectorEnd), bool>,
}

impl Mc4Status {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_installed(&self, id: &str, end: ConnectorEnd) -> bool {
        self.installed.get(&(id.to_string(), end)).copied().unwrap_or(false)
    }

    /// Flip one connector; returns the new state.
    pub fn toggle(&mut self, id: &str, end: ConnectorEnd) -> bool {
        let flag = self.installed.entry((id.to_string(), end)).or_insert(false);
        *flag = !*flag;
        debug!(%id, ?end, installed = *flag, "connector toggled");
        *flag
    }

    pub fn set(&mut self, id: &str, end: ConnectorEnd, installed: bool) {
        self.installed.insert((id.to_string(), end), installed);
    }

    /// Count installed connectors among `table_count` tables (two ends each).
    #[must_use]
    pub fn stats(&self, table_count: usize) -> ConnectorStats {
        ConnectorStats {
            installed: self.installed.values().filter(|v| **v).count(),
            total: table_count * 2,
        }
    }

    pub fn clear(&mut self) {
        self.installed.clear();
    }
}
