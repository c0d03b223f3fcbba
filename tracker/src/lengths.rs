//! Length table: per-id cable lengths split into `plus` and `minus` maps.
//!
//! Rows arrive already split into cells; delimiter and quoting are the
//! host's concern. Two shapes are accepted:
//!
//! - **Headered**: the first row names an id column (`string id`,
//!   `string_id`, `StringID`, ...) plus any of a `plus` column, a `minus`
//!   column, or a signed `length` column. Matching is case-insensitive.
//! - **Positional**: anything else. Every row, including an unrecognized
//!   first row, is read as `id, plus, minus`.
//!
//! Values from the `plus`/`minus` columns are stored sign-stripped in their
//! own map. Values from a signed `length` column are routed by sign:
//! non-negative to `plus`, negative (sign-stripped) to `minus`. Rows with an
//! empty id are skipped; unparseable cells are skipped individually.

#[cfg(test)]
#[path = "lengths_test.rs"]
mod lengths_test;

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::ident;

/// Whether an id has any length entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LengthStatus {
    Measured,
    Unmeasured,
}

/// Column positions resolved from a header row (or the positional fallback).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    id: usize,
    plus: Option<usize>,
    minus: Option<usize>,
    signed: Option<usize>,
}

const POSITIONAL: Columns = Columns { id: 0, plus: Some(1), minus: Some(2), signed: None };

/// Two id -> length maps keyed by normalized id.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LengthTable {
    plus: BTreeMap<String, f64>,
    minus: BTreeMap<String, f64>,
}

impl LengthTable {
    /// Build both maps from raw rows. Later rows overwrite earlier ones for the same id.
    #[must_use]
    pub fn build(rows: &[Vec<String>]) -> Self {
        let (columns, data) = match rows.split_first() {
            Some((header, rest)) => match detect_columns(header) {
                Some(columns) => (columns, rest),
                None => (POSITIONAL, rows),
            },
            None => (POSITIONAL, rows),
        };

        let mut table = Self::default();
        let mut skipped = 0usize;
        for row in data {
            if !table.ingest(row, columns) {
                skipped += 1;
            }
        }

        if skipped > 0 {
            warn!(skipped, "length rows without id or usable values skipped");
        }
        info!(plus = table.plus.len(), minus = table.minus.len(), "length table built");
        table
    }

    /// Insert one row; returns `false` when it contributed nothing.
    fn ingest(&mut self, row: &[String], columns: Columns) -> bool {
        let id = ident::normalize_opt(row.get(columns.id).map(String::as_str));
        if id.is_empty() {
            return false;
        }
        let cell = |idx: Option<usize>| idx.and_then(|i| row.get(i)).and_then(|s| parse_length(s));

        let mut used = false;
        if let Some(v) = cell(columns.plus) {
            self.plus.insert(id.clone(), v.abs());
            used = true;
        }
        if let Some(v) = cell(columns.minus) {
            self.minus.insert(id.clone(), v.abs());
            used = true;
        }
        if let Some(v) = cell(columns.signed) {
            if v < 0.0 {
                self.minus.insert(id, -v);
            } else {
                self.plus.insert(id, v);
            }
            used = true;
        }
        used
    }

    #[must_use]
    pub fn plus(&self, id: &str) -> Option<f64> {
        self.plus.get(id).copied()
    }

    #[must_use]
    pub fn minus(&self, id: &str) -> Option<f64> {
        self.minus.get(id).copied()
    }

    #[must_use]
    pub fn status(&self, id: &str) -> LengthStatus {
        if self.plus.contains_key(id) || self.minus.contains_key(id) {
            LengthStatus::Measured
        } else {
            LengthStatus::Unmeasured
        }
    }

    /// Sum of every `plus` and `minus` entry; the whole field's DC length.
    #[must_use]
    pub fn field_total(&self) -> f64 {
        self.plus.values().chain(self.minus.values()).sum()
    }

    #[must_use]
    pub fn plus_map(&self) -> &BTreeMap<String, f64> {
        &self.plus
    }

    #[must_use]
    pub fn minus_map(&self) -> &BTreeMap<String, f64> {
        &self.minus
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plus.is_empty() && self.minus.is_empty()
    }
}

fn detect_columns(header: &[String]) -> Option<Columns> {
    let lower: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();
    let id = lower.iter().position(|h| is_id_header(h))?;
    let find = |pred: &dyn Fn(&str) -> bool| lower.iter().enumerate().position(|(i, h)| i != id && pred(h.as_str()));
    let plus = find(&|h| h.contains("plus"));
    let minus = find(&|h| h.contains("minus"));
    let signed = find(&|h| h.contains("length") && !h.contains("plus") && !h.contains("minus"));
    if plus.is_none() && minus.is_none() && signed.is_none() {
        return None;
    }
    Some(Columns { id, plus, minus, signed })
}

/// `string` followed by `id`, directly or with one character between.
fn is_id_header(h: &str) -> bool {
    h.match_indices("string").any(|(i, m)| {
        let rest = &h[i + m.len()..];
        rest.starts_with("id") || rest.chars().next().is_some_and(|c| rest[c.len_utf8()..].starts_with("id"))
    })
}

/// Parse the longest numeric prefix of `raw`, like a lenient float reader:
/// `"12.5 m"` -> `12.5`, `"-3"` -> `-3`, `"abc"` -> `None`.
#[must_use]
pub fn parse_length(raw: &str) -> Option<f64> {
    let s = raw.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end = 1;
    }
    let int_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    let mut digits = end - int_start;
    if end < bytes.len() && bytes[end] == b'.' {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        digits += frac_end - frac_start;
        if digits > 0 {
            end = frac_end;
        }
    }
    if digits == 0 {
        return None;
    }
    if end < bytes.len() && matches!(bytes[end], b'e' | b'E') {
        let mut exp_end = end + 1;
        if exp_end < bytes.len() && matches!(bytes[exp_end], b'+' | b'-') {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while exp_end < bytes.len() && bytes[exp_end].is_ascii_digit() {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }
    match s[..end].parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => None,
    }
}
