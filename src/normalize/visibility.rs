use crate::types::Sheet;

/// Rows and columns made visible by [`unhide_all`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Unhidden {
    pub rows: usize,
    pub col_spans: usize,
}

/// Clear every hidden flag on rows and column spans. Idempotent.
pub fn unhide_all(sheet: &mut Sheet) -> Unhidden {
    let mut unhidden = Unhidden::default();

    for props in sheet.rows.values_mut().filter(|p| p.hidden) {
        props.hidden = false;
        unhidden.rows += 1;
    }
    // Rows that only existed to carry the flag
    sheet.rows.retain(|_, props| props.hidden || !props.attrs.is_empty());

    for span in sheet.cols.iter_mut().filter(|s| s.hidden) {
        span.hidden = false;
        unhidden.col_spans += 1;
    }

    if unhidden != Unhidden::default() {
        sheet.dirty = true;
        tracing::debug!(
            sheet = %sheet.name,
            rows = unhidden.rows,
            col_spans = unhidden.col_spans,
            "unhid rows and columns"
        );
    }
    unhidden
}
