//! Splitting delimited length files into rows of cells.
//!
//! Field exports arrive as comma, semicolon or tab separated text, sometimes
//! with a byte-order mark and quoted cells that may span lines. Header
//! detection is left to [`tracker::lengths::LengthTable::build`]; this only
//! produces cells.

#[cfg(test)]
#[path = "delimited_test.rs"]
mod delimited_test;

const CANDIDATES: [u8; 3] = [b',', b';', b'\t'];

/// The candidate delimiter occurring most often on the first non-blank line.
/// Ties and lines with none fall back to a comma.
#[must_use]
pub fn detect_delimiter(text: &str) -> u8 {
    let Some(first) = text.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };
    let mut best = (b',', 0);
    for c in CANDIDATES {
        let n = first.bytes().filter(|b| *b == c).count();
        if n > best.1 {
            best = (c, n);
        }
    }
    best.0
}

/// Rows of trimmed cells. Blank rows are dropped; a leading BOM is stripped.
/// Rows may have differing cell counts.
///
/// # Errors
///
/// Returns the reader's error for malformed input.
pub fn split_rows(text: &str) -> Result<Vec<Vec<String>>, csv::Error> {
    let text = text.strip_prefix('\u{FEFF}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(text))
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(str::is_empty) {
            continue;
        }
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(rows)
}
