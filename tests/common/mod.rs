//! Common test utilities and assertion helpers.
//!
//! Parsing shortcuts, finding lookups on reports, and a scripted OCR delegate.
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]

use std::sync::Mutex;

use doccheck::{AuditResult, CellValue, FindingKind, OcrDelegate, OcrOutcome, Sheet, Workbook};

// ============================================================================
// Workbook Helpers
// ============================================================================

/// Parse XLSX bytes, panicking on failure.
#[must_use]
pub fn parse_xlsx(data: &[u8]) -> Workbook {
    doccheck::parse(data).expect("Failed to parse XLSX")
}

/// Sheet by name, panicking when it does not exist.
pub fn sheet<'a>(workbook: &'a Workbook, name: &str) -> &'a Sheet {
    workbook
        .sheet(name)
        .unwrap_or_else(|| panic!("sheet '{name}' not found"))
}

/// Text of the cell at `cell_ref` ("B3"), or `None` for a missing or non-string cell.
pub fn cell_text<'a>(sheet: &'a Sheet, cell_ref: &str) -> Option<&'a str> {
    let (col, row) = doccheck::cell_ref::parse_cell_ref(cell_ref).expect("bad cell ref");
    sheet.cell(row, col).and_then(|c| c.text())
}

pub fn assert_cell_text(sheet: &Sheet, cell_ref: &str, expected: &str) {
    assert_eq!(
        cell_text(sheet, cell_ref),
        Some(expected),
        "unexpected text at {}!{cell_ref}",
        sheet.name
    );
}

pub fn assert_cell_number(sheet: &Sheet, cell_ref: &str, expected: f64) {
    let (col, row) = doccheck::cell_ref::parse_cell_ref(cell_ref).expect("bad cell ref");
    match sheet.value(row, col) {
        Some(CellValue::Number(n)) => assert_eq!(*n, expected, "{}!{cell_ref}", sheet.name),
        other => panic!("expected number at {}!{cell_ref}, got {other:?}", sheet.name),
    }
}

/// True when no string cell anywhere in the workbook contains CR or LF.
pub fn has_no_line_breaks(workbook: &Workbook) -> bool {
    workbook.sheets.iter().all(|sheet| {
        sheet
            .cells
            .values()
            .filter_map(|c| c.text())
            .all(|t| !t.contains(['\n', '\r']))
    })
}

// ============================================================================
// Report Helpers
// ============================================================================

/// The `count` of the first issue or warning of `kind`.
pub fn finding_count(result: &AuditResult, kind: FindingKind) -> Option<u32> {
    result
        .issues
        .iter()
        .chain(&result.warnings)
        .find(|f| f.kind == kind)
        .and_then(|f| f.count)
}

/// Message of the first issue or warning of `kind`.
pub fn finding_message(result: &AuditResult, kind: FindingKind) -> Option<&str> {
    result
        .issues
        .iter()
        .chain(&result.warnings)
        .find(|f| f.kind == kind)
        .map(|f| f.message.as_str())
}

pub fn assert_clean(result: &AuditResult) {
    assert_eq!(result.score, 100, "issues: {:?}", result.issues);
    assert!(result.issues.is_empty(), "issues: {:?}", result.issues);
    assert!(result.warnings.is_empty(), "warnings: {:?}", result.warnings);
    assert!(result.cell_issues.is_empty());
}

// ============================================================================
// Scripted OCR
// ============================================================================

/// OCR delegate that replays canned outcomes in order and records the images it saw.
pub struct ScriptedOcr {
    outcomes: Mutex<Vec<OcrOutcome>>,
    pub seen: Mutex<Vec<Vec<u8>>>,
}

impl ScriptedOcr {
    pub fn new(outcomes: Vec<OcrOutcome>) -> Self {
        let mut outcomes = outcomes;
        outcomes.reverse();
        Self {
            outcomes: Mutex::new(outcomes),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

impl OcrDelegate for ScriptedOcr {
    fn is_available(&self) -> bool {
        true
    }

    fn recognize(&self, image: &[u8]) -> OcrOutcome {
        self.seen.lock().unwrap().push(image.to_vec());
        self.outcomes
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| OcrOutcome::failed("script exhausted"))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
