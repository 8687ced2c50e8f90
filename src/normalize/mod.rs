//! Normalization pipeline.
//!
//! Runs merge flattening, then line-break stripping, then (analysis mode only)
//! status-symbol recoding, then visibility reset. Flattening has to come first so
//! the stripping pass sees the expanded cell set.

pub mod content;
pub mod flatten;
pub mod visibility;

use serde::Serialize;

use crate::types::{Cell, Mode, Workbook};

pub use content::{recode_status_symbols, strip_line_breaks};
pub use flatten::flatten_merges;
pub use visibility::unhide_all;

/// Counts of what one normalization run changed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeSummary {
    pub merges_flattened: usize,
    pub line_breaks_stripped: usize,
    pub symbols_recoded: usize,
    pub rows_unhidden: usize,
    pub col_spans_unhidden: usize,
}

/// Normalize a freshly loaded workbook in place.
pub fn normalize(workbook: &mut Workbook, mode: Mode) -> NormalizeSummary {
    let blank = Cell {
        style: workbook.styles.default_style(),
        ..Cell::default()
    };
    let mut summary = NormalizeSummary::default();

    for sheet in &mut workbook.sheets {
        summary.merges_flattened += flatten_merges(sheet, &blank);
        summary.line_breaks_stripped += strip_line_breaks(sheet);
        if mode == Mode::Analysis {
            summary.symbols_recoded += recode_status_symbols(sheet, &blank);
        }
        let unhidden = unhide_all(sheet);
        summary.rows_unhidden += unhidden.rows;
        summary.col_spans_unhidden += unhidden.col_spans;
    }

    tracing::info!(
        mode = %mode,
        merges = summary.merges_flattened,
        line_breaks = summary.line_breaks_stripped,
        recoded = summary.symbols_recoded,
        rows = summary.rows_unhidden,
        col_spans = summary.col_spans_unhidden,
        "normalized workbook"
    );
    summary
}
