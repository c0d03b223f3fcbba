//! Selection store: the set of selected table ids plus a bounded linear
//! history of whole-set snapshots.
//!
//! Every mutation is a `state -> state` transform applied against the
//! current committed snapshot ([`SelectionStore::apply`]). A transform that
//! yields an equal set is dropped without touching history, so no-op
//! gestures never create undo steps. Committing truncates any redo tail
//! before appending.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

use crate::consts::HISTORY_LIMIT;
use crate::doc::Feature;
use crate::shape::Bounds;

/// A snapshot of selected ids.
pub type SelectionSet = BTreeSet<String>;

/// Selected ids with undo/redo history.
///
/// `history[cursor]` is always the current selection. The oldest snapshots
/// are discarded once more than `limit` are held.
#[derive(Debug, Clone)]
pub struct SelectionStore {
    history: VecDeque<SelectionSet>,
    cursor: usize,
    limit: usize,
}

impl Default for SelectionStore {
    fn default() -> Self {
        Self::new(HISTORY_LIMIT)
    }
}

impl SelectionStore {
    /// Empty selection holding at most `limit` snapshots (at least one).
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self { history: VecDeque::from([SelectionSet::new()]), cursor: 0, limit: limit.max(1) }
    }

    #[must_use]
    pub fn current(&self) -> &SelectionSet {
        // The constructor seeds one snapshot and nothing ever empties the log.
        &self.history[self.cursor]
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.current().contains(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current().is_empty()
    }

    /// Number of snapshots held, the current one included.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.history.len()
    }

    /// Apply `transform` to the current snapshot and commit the result.
    ///
    /// Returns `false` and leaves history untouched when the result equals
    /// the current set.
    pub fn apply(&mut self, transform: impl FnOnce(&SelectionSet) -> SelectionSet) -> bool {
        let next = transform(self.current());
        if &next == self.current() {
            return false;
        }
        self.history.truncate(self.cursor + 1);
        self.history.push_back(next);
        while self.history.len() > self.limit {
            self.history.pop_front();
        }
        self.cursor = self.history.len() - 1;
        debug!(selected = self.len(), history = self.history.len(), "selection committed");
        true
    }

    /// Add `id` if absent, remove it if present.
    pub fn toggle_one(&mut self, id: &str) -> bool {
        self.apply(|current| {
            let mut next = current.clone();
            if !next.remove(id) {
                next.insert(id.to_string());
            }
            next
        })
    }

    pub fn add_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        self.apply(|current| {
            let mut next = current.clone();
            next.extend(ids.into_iter().map(str::to_string));
            next
        })
    }

    pub fn remove_many<'a>(&mut self, ids: impl IntoIterator<Item = &'a str>) -> bool {
        self.apply(|current| {
            let mut next = current.clone();
            for id in ids {
                next.remove(id);
            }
            next
        })
    }

    /// Step back one snapshot. No-op at the oldest snapshot.
    pub fn undo(&mut self) -> bool {
        if !self.can_undo() {
            return false;
        }
        self.cursor -= 1;
        debug!(cursor = self.cursor, selected = self.len(), "selection undo");
        true
    }

    /// Step forward one snapshot. No-op at the newest snapshot.
    pub fn redo(&mut self) -> bool {
        if !self.can_redo() {
            return false;
        }
        self.cursor += 1;
        debug!(cursor = self.cursor, selected = self.len(), "selection redo");
        true
    }

    /// Empty selection and fresh history.
    pub fn reset(&mut self) {
        self.history = VecDeque::from([SelectionSet::new()]);
        self.cursor = 0;
    }

    /// Keep the current selection as the only snapshot; nothing to undo afterwards.
    pub fn collapse_history(&mut self) {
        let current = self.current().clone();
        self.history = VecDeque::from([current]);
        self.cursor = 0;
    }
}

/// Ids of selectable features whose geometry intersects `rect`.
///
/// Partially covered features count. Each id appears once, in feature order.
#[must_use]
pub fn resolve_region(rect: &Bounds, features: &[Feature]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    features
        .iter()
        .filter(|f| f.is_selectable() && f.shape.intersects_rect(rect))
        .filter_map(|f| seen.insert(f.id.clone()).then(|| f.id.clone()))
        .collect()
}
