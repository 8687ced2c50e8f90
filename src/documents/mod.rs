//! Document analysis entry point.
//!
//! Picks a checker from the declared filename's extension. Spreadsheets go
//! through the structural audit; the other kinds get presence checks. Any
//! error a checker returns is turned into a single `ERROR` issue here.

pub mod image;
pub mod pdf;
pub mod raster;
#[cfg(feature = "pdfium")]
pub mod render;
pub mod slides;
pub mod word;

use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::io::{Cursor, Read, Seek};
use zip::ZipArchive;

use crate::audit::{audit_with, error_result};
use crate::error::Result;
use crate::ocr::OcrDelegate;
use crate::parser;
use crate::types::{AuditResult, Mode};
use crate::xml_helpers::attr_string;

/// Document family, decided by extension only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Spreadsheet,
    Word,
    Presentation,
    Pdf,
    Image,
    Unknown,
}

impl DocumentKind {
    /// Classify a lower-cased extension including its dot (".xlsx").
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            ".xlsx" | ".xls" => Self::Spreadsheet,
            ".docx" | ".doc" => Self::Word,
            ".pptx" | ".ppt" => Self::Presentation,
            ".pdf" => Self::Pdf,
            ".jpg" | ".jpeg" | ".png" | ".gif" | ".bmp" => Self::Image,
            _ => Self::Unknown,
        }
    }
}

/// Lower-cased extension of `filename` with its dot, or "" when there is none.
pub fn file_extension(filename: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
    match base.rfind('.') {
        Some(dot) if dot > 0 => base.get(dot..).unwrap_or_default().to_lowercase(),
        _ => String::new(),
    }
}

/// Report plus the optional extracted-text artifact.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    #[serde(flatten)]
    pub result: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extracted_text: Option<String>,
}

impl Analysis {
    pub fn report(result: AuditResult) -> Self {
        Self {
            result,
            extracted_text: None,
        }
    }
}

/// Analyze one uploaded document.
///
/// Never fails: load and traversal errors become an `ERROR` issue on an
/// otherwise empty report.
pub fn analyze_document(
    filename: &str,
    data: &[u8],
    mode: Mode,
    ocr: &dyn OcrDelegate,
) -> Analysis {
    let file_type = file_extension(filename);
    let kind = DocumentKind::from_extension(&file_type);
    tracing::info!(filename, ?kind, bytes = data.len(), %mode, "analyzing document");

    let outcome = match kind {
        DocumentKind::Spreadsheet => parser::parse(data)
            .map(|workbook| Analysis::report(audit_with(&workbook, &file_type, mode))),
        DocumentKind::Word => word::check_word(data, &file_type, mode).map(Analysis::report),
        DocumentKind::Presentation => {
            slides::check_slides(data, &file_type, mode).map(Analysis::report)
        }
        DocumentKind::Pdf => pdf::check_pdf(data, &file_type, mode, ocr),
        DocumentKind::Image => Ok(image::check_image(data, &file_type, mode, ocr)),
        DocumentKind::Unknown => Ok(Analysis::report(AuditResult::new(&file_type, mode).finish())),
    };

    let analysis =
        outcome.unwrap_or_else(|e| Analysis::report(error_result(&file_type, mode, &e)));
    tracing::info!(
        score = analysis.result.score,
        grade = ?analysis.result.grade,
        issues = analysis.result.issues.len(),
        warnings = analysis.result.warnings.len(),
        "analysis finished"
    );
    analysis
}

/// Read the package's main part, following the `officeDocument` relationship
/// in `_rels/.rels` and falling back to `default_path`.
pub(crate) fn read_main_part(data: &[u8], default_path: &str) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(data))?;
    let path = office_document_target(&mut archive).unwrap_or_else(|| default_path.to_string());
    let mut file = archive.by_name(&path)?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;
    Ok(buf)
}

fn office_document_target<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Option<String> {
    let mut rels = String::new();
    archive
        .by_name("_rels/.rels")
        .ok()?
        .read_to_string(&mut rels)
        .ok()?;

    let mut reader = Reader::from_str(&rels);
    reader.trim_text(true);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.local_name().as_ref() == b"Relationship" => {
                let rel_type = attr_string(&e, b"Type").unwrap_or_default();
                if rel_type.ends_with("/officeDocument") {
                    let target = attr_string(&e, b"Target")?;
                    return Some(target.trim_start_matches('/').to_string());
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            _ => {}
        }
    }
}
