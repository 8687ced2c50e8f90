//! Merge flattening.
//!
//! Each merge region is dissolved and every cell of its rectangle receives the
//! source cell's value plus its own copy of the source's font, fill, border and
//! alignment. Components the source does not have are left as they were on the
//! target; number format and protection always stay the target's own.

use crate::types::{Cell, CellStyle, CellValue, Formula, MergeRegion, Sheet};

/// What gets propagated from a region's source cell.
#[derive(Debug, Clone)]
struct Captured {
    value: Option<CellValue>,
    shared_index: Option<u32>,
    formula: Option<Formula>,
    style: CellStyle,
}

impl Captured {
    fn from_source(sheet: &Sheet, region: &MergeRegion, blank: &Cell) -> Self {
        let (row, col) = region.source();
        let source = sheet.cell(row, col).unwrap_or(blank);
        Self {
            value: source.value.clone(),
            shared_index: source.shared_index,
            // Copies carry the formula text only; shared/array bookkeeping stays on the source
            formula: source
                .formula
                .as_ref()
                .filter(|f| !f.is_shared_child())
                .map(|f| Formula {
                    text: f.text.clone(),
                    attrs: Vec::new(),
                }),
            style: source.style.clone(),
        }
    }

    fn apply_to(&self, cell: &mut Cell) {
        cell.value.clone_from(&self.value);
        cell.shared_index = self.shared_index;
        cell.formula.clone_from(&self.formula);

        if let Some(font) = &self.style.font {
            cell.style.font = Some(font.clone());
        }
        if let Some(fill) = &self.style.fill {
            cell.style.fill = Some(fill.clone());
        }
        if let Some(border) = &self.style.border {
            cell.style.border = Some(border.clone());
        }
        if let Some(alignment) = &self.style.alignment {
            cell.style.alignment = Some(alignment.clone());
        }
    }
}

/// Dissolve every merge region on the sheet. Returns the number of regions flattened.
///
/// `blank` is the cell inserted where a covered position has no `<c>` element yet.
pub fn flatten_merges(sheet: &mut Sheet, blank: &Cell) -> usize {
    let regions = std::mem::take(&mut sheet.merges);
    if regions.is_empty() {
        return 0;
    }

    for region in &regions {
        let captured = Captured::from_source(sheet, region, blank);
        for (row, col) in region.positions() {
            if (row, col) == region.source() {
                // The source keeps its own formula attributes
                let cell = sheet.cell_or_insert(row, col, blank);
                let formula = cell.formula.take();
                captured.apply_to(cell);
                cell.formula = formula;
                continue;
            }
            captured.apply_to(sheet.cell_or_insert(row, col, blank));
        }
        tracing::debug!(sheet = %sheet.name, range = %region.label(), "flattened merge region");
    }

    sheet.dirty = true;
    regions.len()
}
