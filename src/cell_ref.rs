//! Utilities for parsing and formatting Excel-style cell references and ranges.
//!
//! All coordinates here are 1-based, matching the worksheet XML and the grid model.

use regex::{Captures, Regex};

use crate::error::{DocCheckError, Result};

/// Parse a cell reference like "B7" into (col, row), both 1-based.
///
/// `$` anchors are ignored. Returns `None` when either part is missing or zero.
pub fn parse_cell_ref(cell_ref: &str) -> Option<(u32, u32)> {
    parse_cell_ref_bytes(cell_ref.trim().as_bytes())
}

/// Bytes equivalent of [`parse_cell_ref`] for raw XML attribute values.
pub fn parse_cell_ref_bytes(ref_bytes: &[u8]) -> Option<(u32, u32)> {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    let mut saw_row = false;

    for &b in ref_bytes {
        if b == b'$' {
            continue;
        }
        if b.is_ascii_alphabetic() {
            if saw_row {
                return None;
            }
            let upper = b.to_ascii_uppercase();
            col = col
                .saturating_mul(26)
                .saturating_add(u32::from(upper - b'A') + 1);
        } else if b.is_ascii_digit() {
            row = row.saturating_mul(10).saturating_add(u32::from(b - b'0'));
            saw_row = true;
        } else {
            return None;
        }
    }

    if col == 0 || row == 0 {
        return None;
    }

    Some((col, row))
}

/// Parse a range like "A1:C3" (or a single cell "A1") into
/// `(min_row, min_col, max_row, max_col)`, normalizing reversed corners.
pub fn parse_cell_range(range: &str) -> Option<(u32, u32, u32, u32)> {
    let (start, end) = range.split_once(':').unwrap_or((range, range));
    let (c1, r1) = parse_cell_ref(start)?;
    let (c2, r2) = parse_cell_ref(end)?;
    Some((r1.min(r2), c1.min(c2), r1.max(r2), c1.max(c2)))
}

/// Convert a 1-based column number to its letter form (1 -> "A", 27 -> "AA").
///
/// Column 0 has no letter form and yields an empty string.
pub fn col_to_letter(col: u32) -> String {
    let mut letters = Vec::new();
    let mut n = col;
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + u8::try_from(rem).unwrap_or(0)));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Format a single cell label like "B2".
pub fn cell_label(row: u32, col: u32) -> String {
    format!("{}{}", col_to_letter(col), row)
}

/// Format a range label like "B2:D4". A one-cell range collapses to "B2".
pub fn range_label(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> String {
    if min_row == max_row && min_col == max_col {
        return cell_label(min_row, min_col);
    }
    format!(
        "{}:{}",
        cell_label(min_row, min_col),
        cell_label(max_row, max_col)
    )
}

/// Largest column and row a worksheet can address.
pub const MAX_COL: u32 = 16_384;
pub const MAX_ROW: u32 = 1_048_576;

/// Moves the relative A1 references of a formula, the way a copied formula
/// is adjusted. `$`-anchored parts stay put, text in string literals and
/// quoted sheet names is untouched, and a reference pushed off the grid
/// becomes `#REF!`.
pub struct RefShifter {
    pattern: Regex,
}

impl RefShifter {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(
            r#""(?:[^"]|"")*"|'(?:[^']|'')*'|(^|[^A-Za-z0-9_.$])(\$?)([A-Z]{1,3})(\$?)([0-9]+)\b"#,
        )
        .map_err(|e| DocCheckError::Parse(e.to_string()))?;
        Ok(Self { pattern })
    }

    pub fn shift(&self, formula: &str, rows: i64, cols: i64) -> String {
        self.pattern
            .replace_all(formula, |caps: &Captures| {
                let whole = caps.get(0).map_or("", |m| m.as_str());
                let Some(prefix) = caps.get(1) else {
                    return whole.to_string();
                };
                // A name followed by "(" is a function such as LOG10.
                let end = caps.get(0).map_or(0, |m| m.end());
                if formula.get(end..).is_some_and(|rest| rest.starts_with('(')) {
                    return whole.to_string();
                }
                let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
                let (col_anchor, letters, row_anchor, digits) = (group(2), group(3), group(4), group(5));

                let Some((col, row)) = parse_cell_ref(&format!("{letters}{digits}")) else {
                    return whole.to_string();
                };
                if col > MAX_COL {
                    return whole.to_string();
                }
                let col = if col_anchor.is_empty() { i64::from(col) + cols } else { i64::from(col) };
                let row = if row_anchor.is_empty() { i64::from(row) + rows } else { i64::from(row) };
                match (u32::try_from(col), u32::try_from(row)) {
                    (Ok(col), Ok(row)) if (1..=MAX_COL).contains(&col) && (1..=MAX_ROW).contains(&row) => {
                        format!(
                            "{}{col_anchor}{}{row_anchor}{row}",
                            prefix.as_str(),
                            col_to_letter(col)
                        )
                    }
                    _ => format!("{}#REF!", prefix.as_str()),
                }
            })
            .into_owned()
    }
}
