use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cell_ref::range_label;

use super::{Cell, CellValue, StyleSheet};

/// Parsed workbook: ordered sheets plus the shared tables they reference.
#[derive(Debug, Default, Clone)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
    pub styles: StyleSheet,
    pub shared_strings: Vec<String>,
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }

    pub fn sheet_mut(&mut self, name: &str) -> Option<&mut Sheet> {
        self.sheets.iter_mut().find(|s| s.name == name)
    }

    /// True when any sheet was modified since load.
    pub fn is_dirty(&self) -> bool {
        self.sheets.iter().any(|s| s.dirty)
    }
}

/// Rectangle of cells rendered as one. Coordinates are 1-based and inclusive.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MergeRegion {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl MergeRegion {
    /// Build a region, normalizing reversed corners.
    pub fn new(row1: u32, col1: u32, row2: u32, col2: u32) -> Self {
        Self {
            min_row: row1.min(row2),
            min_col: col1.min(col2),
            max_row: row1.max(row2),
            max_col: col1.max(col2),
        }
    }

    /// The top-left cell, the only one holding a value before flattening.
    pub fn source(&self) -> (u32, u32) {
        (self.min_row, self.min_col)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }

    /// Every `(row, col)` in the rectangle, row-major.
    pub fn positions(&self) -> impl Iterator<Item = (u32, u32)> {
        let (min_col, max_col) = (self.min_col, self.max_col);
        (self.min_row..=self.max_row).flat_map(move |r| (min_col..=max_col).map(move |c| (r, c)))
    }

    /// Human-readable label like "B2:D4".
    pub fn label(&self) -> String {
        range_label(self.min_row, self.min_col, self.max_row, self.max_col)
    }
}

/// `<row>` properties. `attrs` keeps everything except `r`, `spans` and `hidden`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowProps {
    pub hidden: bool,
    pub attrs: Vec<(String, String)>,
}

/// `<col>` span. `attrs` keeps everything except `min`, `max` and `hidden`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColSpan {
    pub min: u32,
    pub max: u32,
    pub hidden: bool,
    pub attrs: Vec<(String, String)>,
}

impl ColSpan {
    pub fn contains(&self, col: u32) -> bool {
        (self.min..=self.max).contains(&col)
    }
}

/// One worksheet of the grid model.
#[derive(Debug, Clone, Default)]
pub struct Sheet {
    pub name: String,
    /// Zip part this sheet was loaded from, e.g. `xl/worksheets/sheet1.xml`.
    pub path: String,
    /// Cells keyed by `(row, col)`, both 1-based.
    pub cells: BTreeMap<(u32, u32), Cell>,
    pub merges: Vec<MergeRegion>,
    pub rows: BTreeMap<u32, RowProps>,
    pub cols: Vec<ColSpan>,
    pub max_row: u32,
    pub max_col: u32,
    /// Set by every rewrite pass that changes the sheet; only dirty sheets are re-serialized.
    pub dirty: bool,
}

impl Sheet {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&(row, col))
    }

    pub fn cell_mut(&mut self, row: u32, col: u32) -> Option<&mut Cell> {
        self.cells.get_mut(&(row, col))
    }

    /// Value of a cell, `None` for missing or empty cells.
    pub fn value(&self, row: u32, col: u32) -> Option<&CellValue> {
        self.cell(row, col).and_then(|c| c.value.as_ref())
    }

    /// Get a cell, inserting an empty one with `default` as its style if absent.
    pub fn cell_or_insert(&mut self, row: u32, col: u32, default: &Cell) -> &mut Cell {
        self.max_row = self.max_row.max(row);
        self.max_col = self.max_col.max(col);
        self.cells
            .entry((row, col))
            .or_insert_with(|| default.clone())
    }

    /// Grow `max_row`/`max_col` to cover every cell and merge region.
    pub fn update_extent(&mut self) {
        for &(row, col) in self.cells.keys() {
            self.max_row = self.max_row.max(row);
            self.max_col = self.max_col.max(col);
        }
        for merge in &self.merges {
            self.max_row = self.max_row.max(merge.max_row);
            self.max_col = self.max_col.max(merge.max_col);
        }
    }

    pub fn is_row_hidden(&self, row: u32) -> bool {
        self.rows.get(&row).is_some_and(|r| r.hidden)
    }

    pub fn is_col_hidden(&self, col: u32) -> bool {
        self.cols.iter().any(|span| span.hidden && span.contains(col))
    }

    /// Hidden rows within `1..=max_row`.
    pub fn hidden_row_count(&self) -> u32 {
        if self.max_row == 0 {
            return 0;
        }
        let count = self
            .rows
            .range(1..=self.max_row)
            .filter(|(_, props)| props.hidden)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Hidden columns within `1..=max_col`.
    pub fn hidden_col_count(&self) -> u32 {
        let count = (1..=self.max_col)
            .filter(|&c| self.is_col_hidden(c))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
