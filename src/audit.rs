//! Structural audit of a loaded workbook.
//!
//! Read-only: scoring never touches the grid. Per sheet it checks merge
//! regions (-3 each), cells with embedded line breaks (warning only) and
//! hidden rows/columns (-15 flat).

use crate::error::DocCheckError;
use crate::parser;
use crate::types::{
    AuditResult, CellIssue, CellIssueKind, Finding, FindingKind, Mode, Severity, Sheet, Workbook,
};

/// Points deducted per merge region.
pub const MERGE_PENALTY: u32 = 3;
/// Flat deduction for a sheet with any hidden row or column.
pub const HIDDEN_PENALTY: u32 = 15;

pub const MERGE_RECOMMENDATION: &str = "병합 해제 후 데이터 정규화 필요";

/// True for the characters the line-break audit and stripping pass act on.
pub fn is_line_break(c: char) -> bool {
    matches!(c, '\n' | '\r')
}

/// Audit a workbook with the default report metadata (`.xlsx`, standard mode).
pub fn audit(workbook: &Workbook) -> AuditResult {
    audit_with(workbook, ".xlsx", Mode::Standard)
}

/// Audit a workbook, tagging the report with the declared file type and mode.
pub fn audit_with(workbook: &Workbook, file_type: &str, mode: Mode) -> AuditResult {
    let mut result = AuditResult::new(file_type, mode);
    for sheet in &workbook.sheets {
        audit_sheet(sheet, &mut result);
    }
    result.finish()
}

/// Load XLSX bytes and audit them. A load failure becomes one `ERROR` issue.
pub fn audit_bytes(data: &[u8], file_type: &str, mode: Mode) -> AuditResult {
    match parser::parse(data) {
        Ok(workbook) => audit_with(&workbook, file_type, mode),
        Err(e) => error_result(file_type, mode, &e),
    }
}

/// Report for a document whose analysis failed outright.
pub fn error_result(file_type: &str, mode: Mode, error: &DocCheckError) -> AuditResult {
    tracing::warn!(error = %error, file_type, "analysis failed");
    let mut result = AuditResult::new(file_type, mode);
    result.issue(Finding::new(FindingKind::Error, error.to_string()));
    result.finish()
}

fn audit_sheet(sheet: &Sheet, result: &mut AuditResult) {
    let merges = u32::try_from(sheet.merges.len()).unwrap_or(u32::MAX);
    if merges > 0 {
        result.deduct(merges.saturating_mul(MERGE_PENALTY));
        for region in &sheet.merges {
            let label = region.label();
            result.cell_issues.push(CellIssue {
                sheet: sheet.name.clone(),
                message: format!("병합된 셀: {label}"),
                cell: label,
                kind: CellIssueKind::MergedCell,
                severity: Severity::High,
                recommendation: MERGE_RECOMMENDATION.to_string(),
            });
        }
        result.issue(Finding::counted(
            FindingKind::MergedCells,
            merges,
            format!("{merges}개의 병합 셀 발견"),
        ));
    }

    let newlines = sheet
        .cells
        .values()
        .filter_map(|cell| cell.text())
        .filter(|text| text.contains(is_line_break))
        .count();
    let newlines = u32::try_from(newlines).unwrap_or(u32::MAX);
    if newlines > 0 {
        result.warn(Finding::counted(
            FindingKind::Newlines,
            newlines,
            format!("{newlines}개 셀에 줄바꿈 포함"),
        ));
    }

    let hidden_rows = sheet.hidden_row_count();
    let hidden_cols = sheet.hidden_col_count();
    if hidden_rows > 0 || hidden_cols > 0 {
        result.deduct(HIDDEN_PENALTY);
        result.issue(Finding::new(
            FindingKind::HiddenData,
            format!("숨겨진 행 {hidden_rows}개, 열 {hidden_cols}개"),
        ));
    }

    tracing::debug!(
        sheet = %sheet.name,
        merges,
        newlines,
        hidden_rows,
        hidden_cols,
        "audited sheet"
    );
}
