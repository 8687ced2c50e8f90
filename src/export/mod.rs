//! XLSX export pipeline.
//!
//! Produces the normalized workbook by patching the original ZIP archive.
//! Only dirty sheets are re-serialized (plus `styles.xml` when flattening
//! introduced a style combination the stylesheet lacks); everything else is
//! passed through byte-identical.

pub(crate) mod sheet_writer;
pub(crate) mod styles_writer;
pub(crate) mod zip_patcher;

use std::collections::HashMap;
use std::io::{Cursor, Read};
use zip::ZipArchive;

use crate::error::{DocCheckError, Result};
use crate::normalize::{normalize, NormalizeSummary};
use crate::parser::parse;
use crate::types::{Mode, Workbook};

use sheet_writer::write_sheet_xml;
use styles_writer::StyleInterner;

/// Save a workbook to XLSX bytes.
///
/// `original_bytes` is the archive the workbook was parsed from. A workbook
/// with no dirty sheet comes back as an exact copy.
pub fn save_xlsx(original_bytes: &[u8], workbook: &Workbook) -> Result<Vec<u8>> {
    if !workbook.is_dirty() {
        return Ok(original_bytes.to_vec());
    }

    let mut archive = ZipArchive::new(Cursor::new(original_bytes))?;
    let mut interner = StyleInterner::new(&workbook.styles);
    let mut replacements: HashMap<String, Vec<u8>> = HashMap::new();

    for sheet in workbook.sheets.iter().filter(|s| s.dirty) {
        let original = read_part(&mut archive, &sheet.path)?;
        let xml = write_sheet_xml(&original, sheet, &workbook.shared_strings, &mut interner)?;
        tracing::debug!(sheet = %sheet.name, path = %sheet.path, bytes = xml.len(), "rewrote worksheet");
        replacements.insert(sheet.path.clone(), xml);
    }

    if interner.has_additions() {
        let path = workbook.styles.path.as_deref().ok_or_else(|| {
            DocCheckError::Other("new cell styles but the workbook has no styles part".into())
        })?;
        let original = read_part(&mut archive, path)?;
        replacements.insert(path.to_string(), interner.patch_styles_xml(&original)?);
    }

    zip_patcher::patch_zip(original_bytes, &replacements)
}

/// Load, normalize and re-save a spreadsheet.
pub fn optimize_xlsx(data: &[u8], mode: Mode) -> Result<(Vec<u8>, NormalizeSummary)> {
    let mut workbook = parse(data)?;
    let summary = normalize(&mut workbook, mode);
    let bytes = save_xlsx(data, &workbook)?;
    Ok((bytes, summary))
}

fn read_part<R: Read + std::io::Seek>(archive: &mut ZipArchive<R>, path: &str) -> Result<Vec<u8>> {
    let mut file = archive.by_name(path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}
