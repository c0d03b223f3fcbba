//! Identifier normalization: one canonical key space for feature ids,
//! length-table rows and selection entries.
//!
//! Survey exports disagree on padding, casing and separators (`str_07`,
//! `STR-7`, `Str 07`). Every id entering the crate goes through
//! [`normalize`] so the three consumers compare the same strings.
//!
//! Two raw ids that differ only in padding collapse to the same key. This is
//! not detected or reported.

#[cfg(test)]
#[path = "ident_test.rs"]
mod ident_test;

/// Token prefixes whose zero-padded numeric suffix is unpadded, longest first.
const UNPADDED_PREFIXES: [&str; 5] = ["SUBS", "SUB", "TX", "INV", "STR"];

/// Canonicalize a raw identifier. Total and idempotent; empty input yields `""`.
///
/// Steps, in order: strip BOM and zero-width characters, trim, upper-case,
/// turn runs of underscores/whitespace into one hyphen, collapse repeated
/// hyphens, then unpad `SUB`/`SUBS`/`TX`/`INV`/`STR` tokens (`STR07` -> `STR7`).
#[must_use]
pub fn normalize(raw: &str) -> String {
    let cleaned: String = raw.chars().filter(|c| !is_invisible(*c)).collect();
    let upper = cleaned.trim().to_uppercase();

    let mut hyphenated = String::with_capacity(upper.len());
    for c in upper.chars() {
        let c = if c == '_' || c.is_whitespace() { '-' } else { c };
        if c == '-' && hyphenated.ends_with('-') {
            continue;
        }
        hyphenated.push(c);
    }

    unpad_tokens(&hyphenated)
}

/// Normalize an optional raw value; `None` yields `""`.
#[must_use]
pub fn normalize_opt(raw: Option<&str>) -> String {
    raw.map_or_else(String::new, normalize)
}

/// Whether `id` belongs to the group named by `prefix`.
///
/// Both sides are normalized; the prefix must end on a hyphen-segment
/// boundary, so `INV3` matches `INV3-STR1` but not `INV31-STR1`. An empty
/// prefix matches nothing.
#[must_use]
pub fn in_group(id: &str, prefix: &str) -> bool {
    let prefix = normalize(prefix);
    let prefix = prefix.trim_end_matches('-');
    if prefix.is_empty() {
        return false;
    }
    let id = normalize(id);
    match id.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('-'),
        None => false,
    }
}

fn is_invisible(c: char) -> bool {
    matches!(c, '\u{FEFF}' | '\u{200B}'..='\u{200D}')
}

/// Unpad every maximal ASCII-alphanumeric token in `s`.
///
/// A bare prefix token followed by one hyphen and a number is joined to it
/// (`SUB-01` -> `SUB1`, `STR-7` -> `STR7`), so separator style does not split keys.
fn unpad_tokens(s: &str) -> String {
    let pieces = split_tokens(s);
    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < pieces.len() {
        let piece = pieces[i];
        if UNPADDED_PREFIXES.contains(&piece) && pieces.get(i + 1) == Some(&"-") {
            if let Some(digits) = pieces.get(i + 2).and_then(|next| joinable_digits(next)) {
                out.push_str(piece);
                out.push_str(digits);
                i += 3;
                continue;
            }
        }
        out.push_str(&unpad_token(piece));
        i += 1;
    }
    out
}

/// Split into alternating runs: ASCII-alphanumeric tokens and single separators.
fn split_tokens(s: &str) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut start = 0;
    for (idx, c) in s.char_indices() {
        if !c.is_ascii_alphanumeric() {
            if start < idx {
                pieces.push(&s[start..idx]);
            }
            pieces.push(&s[idx..idx + c.len_utf8()]);
            start = idx + c.len_utf8();
        }
    }
    if start < s.len() {
        pieces.push(&s[start..]);
    }
    pieces
}

/// `STR007` -> `STR7`, `STR000` -> `STR0`. Tokens without a known prefix,
/// without a leading zero, or with non-digit trailers pass through unchanged.
fn unpad_token(token: &str) -> String {
    for prefix in UNPADDED_PREFIXES {
        let Some(rest) = token.strip_prefix(prefix) else {
            continue;
        };
        if let Some(digits) = unpad_digits(rest) {
            return format!("{prefix}{digits}");
        }
    }
    token.to_string()
}

/// An all-digit token, unpadded; `None` for anything else.
fn joinable_digits(token: &str) -> Option<&str> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(unpad_digits(token).unwrap_or(token))
}

/// Strip the zero padding from an all-digit run of at least two characters
/// that starts with `0`. Keeps one digit, so `000` becomes `0`.
fn unpad_digits(digits: &str) -> Option<&str> {
    if digits.len() < 2 || !digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let trimmed = digits.trim_start_matches('0');
    Some(if trimmed.is_empty() { &digits[digits.len() - 1..] } else { trimmed })
}
