//! PDF documents: text extractability and OCR of scanned pages.
//!
//! Only the first [`PAGES_CHECKED`] pages are looked at. A PDF with no text on
//! any of them is treated as a scan: each page is turned into an image (see
//! [`raster`]) and handed to the OCR delegate, and the results are joined with
//! page headers.

use lopdf::{Document, ObjectId};

use crate::error::Result;
use crate::ocr::{OcrDelegate, OcrOutcome, NO_KEY_MESSAGE};
use crate::types::{AuditResult, Finding, FindingKind, Mode};

use super::{raster, Analysis};

pub const PAGES_CHECKED: usize = 3;
/// Deduction for a PDF without extractable text.
pub const SCANNED_PENALTY: u32 = 20;

pub const NO_KEY_WARNING: &str = "OCR을 위해 API 키가 필요합니다";

pub fn check_pdf(
    data: &[u8],
    file_type: &str,
    mode: Mode,
    ocr: &dyn OcrDelegate,
) -> Result<Analysis> {
    let doc = Document::load_mem(data)?;
    let pages: Vec<(u32, ObjectId)> = doc.get_pages().into_iter().take(PAGES_CHECKED).collect();

    let mut extracted = String::new();
    for &(number, _) in &pages {
        let text = page_text(&doc, number);
        let text = text.trim();
        if !text.is_empty() {
            extracted.push_str(text);
            extracted.push_str("\n\n");
        }
    }

    let mut result = AuditResult::new(file_type, mode);
    if !extracted.is_empty() {
        tracing::debug!(pages = pages.len(), chars = extracted.len(), "PDF has text");
        return Ok(Analysis {
            result: result.finish(),
            extracted_text: Some(extracted),
        });
    }

    result.deduct(SCANNED_PENALTY);
    result.issue(Finding::new(
        FindingKind::ScannedPdf,
        "스캔된 PDF - OCR 처리 중...",
    ));

    if !ocr.is_available() {
        result.warn(Finding::new(FindingKind::NoApiKey, NO_KEY_WARNING));
        return Ok(Analysis::report(result.finish()));
    }

    tracing::info!(pages = pages.len(), delegate = ocr.name(), "running OCR on scanned PDF");
    let mut full_text = String::new();
    let mut recognized = 0u32;
    let mut failed = 0u32;
    let mut causes: Vec<String> = Vec::new();
    for (i, image) in scan_images(data, &doc, &pages).into_iter().enumerate() {
        let outcome = match image {
            Ok(image) => ocr.recognize(&image),
            Err(e) => {
                tracing::debug!(page = i + 1, error = %e, "no usable page image");
                OcrOutcome::failed(e)
            }
        };
        let cause = match &outcome {
            OcrOutcome::Text(_) => None,
            OcrOutcome::Failed(cause) => Some(cause.clone()),
            OcrOutcome::Unavailable => Some(NO_KEY_MESSAGE.to_string()),
        };
        match cause {
            None => recognized += 1,
            Some(cause) => {
                failed += 1;
                if !causes.contains(&cause) {
                    causes.push(cause);
                }
            }
        }
        full_text.push_str(&format!(
            "\n\n=== 페이지 {} ===\n\n{}",
            i + 1,
            outcome.into_text()
        ));
    }

    if recognized > 0 {
        result.warn(Finding::new(
            FindingKind::OcrSuccess,
            format!("Claude OCR로 {recognized}페이지 텍스트 추출 완료"),
        ));
    }
    if failed > 0 {
        result.issue(Finding::counted(
            FindingKind::OcrFailed,
            failed,
            format!("{failed}페이지 텍스트 추출 실패 ({})", causes.join("; ")),
        ));
    }

    Ok(Analysis {
        result: result.finish(),
        extracted_text: (!full_text.is_empty()).then_some(full_text),
    })
}

/// Text of one page. Pages lopdf cannot decode count as empty.
fn page_text(doc: &Document, number: u32) -> String {
    doc.extract_text(&[number]).unwrap_or_else(|e| {
        tracing::debug!(page = number, error = %e, "text extraction failed");
        String::new()
    })
}

/// One OCR-ready image per page.
///
/// With the `pdfium` feature the pages are rendered whole; when pdfium cannot
/// be loaded, or without the feature, the largest embedded image is used.
fn scan_images(data: &[u8], doc: &Document, pages: &[(u32, ObjectId)]) -> Vec<Result<Vec<u8>>> {
    #[cfg(feature = "pdfium")]
    {
        match super::render::render_pages(data, pages.len()) {
            Ok(rendered) => return rendered.iter().map(raster::encode_png).collect(),
            Err(e) => tracing::warn!(error = %e, "page rendering unavailable, using embedded images"),
        }
    }
    #[cfg(not(feature = "pdfium"))]
    let _ = data;

    pages
        .iter()
        .map(|&(_, page_id)| raster::page_scan_image(doc, page_id))
        .collect()
}
