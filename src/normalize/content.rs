//! Cell content normalization: line-break stripping and status-symbol recoding.

use crate::audit::is_line_break;
use crate::types::{Cell, CellValue, Sheet};

/// Row holding the column headers that drive symbol recoding.
pub const HEADER_ROW: u32 = 4;

/// Header substrings that mark a yes/no status column ("whether", "receipt").
pub const STATUS_HEADER_MARKERS: [&str; 2] = ["여부", "수령"];

pub const AFFIRMATIVE: &str = "예";
pub const NEGATIVE: &str = "아니오";

const AFFIRMATIVE_SYMBOLS: [&str; 4] = ["○", "O", "o", "●"];
const NEGATIVE_SYMBOLS: [&str; 3] = ["", "X", "×"];

/// Replace every line break with a single space. A `\r\n` pair counts as one break.
pub fn replace_line_breaks(text: &str) -> String {
    text.replace("\r\n", " ").replace(is_line_break, " ")
}

/// Strip line breaks from every string cell. Returns the number of cells changed.
pub fn strip_line_breaks(sheet: &mut Sheet) -> usize {
    let mut changed = 0;
    for cell in sheet.cells.values_mut() {
        let Some(CellValue::String(text)) = cell.value.as_mut() else {
            continue;
        };
        if !text.contains(is_line_break) {
            continue;
        }
        *text = replace_line_breaks(text);
        changed += 1;
    }
    if changed > 0 {
        sheet.dirty = true;
        tracing::debug!(sheet = %sheet.name, cells = changed, "stripped line breaks");
    }
    changed
}

/// Canonical token for a status value, or `None` when it is outside the vocabulary.
pub fn recode_symbol(value: Option<&CellValue>) -> Option<&'static str> {
    let text = match value {
        None => "",
        Some(CellValue::String(s)) => s.as_str(),
        Some(_) => return None,
    };
    if AFFIRMATIVE_SYMBOLS.contains(&text) {
        Some(AFFIRMATIVE)
    } else if NEGATIVE_SYMBOLS.contains(&text) {
        Some(NEGATIVE)
    } else {
        None
    }
}

fn is_status_header(header: &str) -> bool {
    STATUS_HEADER_MARKERS.iter().any(|m| header.contains(m))
}

/// Recode status symbols under status headers (analysis mode).
///
/// Every row after the first is visited; the header comes from [`HEADER_ROW`]
/// of the same column regardless of where the table actually starts. Missing
/// cells under a status header are created with `blank` as their base.
pub fn recode_status_symbols(sheet: &mut Sheet, blank: &Cell) -> usize {
    let status_cols: Vec<u32> = (1..=sheet.max_col)
        .filter(|&col| {
            sheet
                .cell(HEADER_ROW, col)
                .and_then(Cell::text)
                .is_some_and(is_status_header)
        })
        .collect();

    let mut changed = 0;
    for row in 2..=sheet.max_row {
        for &col in &status_cols {
            let Some(token) = recode_symbol(sheet.value(row, col)) else {
                continue;
            };
            let cell = sheet.cell_or_insert(row, col, blank);
            cell.value = Some(CellValue::from(token));
            cell.shared_index = None;
            cell.formula = None;
            changed += 1;
        }
    }
    if changed > 0 {
        sheet.dirty = true;
        tracing::debug!(sheet = %sheet.name, cells = changed, "recoded status symbols");
    }
    changed
}
