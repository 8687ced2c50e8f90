//! XLSX loading.
//!
//! Opens the ZIP container, follows the workbook relationships to the shared
//! strings, styles and worksheet parts, and builds the grid model.

mod relationships;
mod worksheet;

use std::io::Cursor;
use zip::ZipArchive;

use crate::error::Result;
use crate::types::Workbook;

use relationships::{
    get_sheet_info, parse_shared_strings, parse_stylesheet, parse_workbook_relationships,
};
use worksheet::parse_sheet;

pub use worksheet::parse_worksheet;

/// Parse XLSX bytes into a [`Workbook`].
pub fn parse(data: &[u8]) -> Result<Workbook> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;

    let relationships = parse_workbook_relationships(&mut archive);
    let shared_strings =
        parse_shared_strings(&mut archive, relationships.shared_strings.as_deref())?;
    let styles = parse_stylesheet(&mut archive, relationships.styles.as_deref())?;
    let sheet_info = get_sheet_info(&mut archive, &relationships)?;

    let mut sheets = Vec::with_capacity(sheet_info.len());
    for info in &sheet_info {
        let sheet = parse_sheet(&mut archive, info, &shared_strings, &styles)?;
        tracing::debug!(
            sheet = %sheet.name,
            cells = sheet.cells.len(),
            merges = sheet.merges.len(),
            max_row = sheet.max_row,
            max_col = sheet.max_col,
            "parsed worksheet"
        );
        sheets.push(sheet);
    }

    tracing::info!(
        sheets = sheets.len(),
        shared_strings = shared_strings.len(),
        cell_xfs = styles.cell_xfs.len(),
        "loaded workbook"
    );

    Ok(Workbook {
        sheets,
        styles,
        shared_strings,
    })
}
