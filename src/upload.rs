//! One upload in, report and download artifacts out.
//!
//! Analysis and optimization each load the document from the uploaded bytes,
//! so nothing the audit does can leak into the rewrite. A failed optimization
//! leaves the report intact and is reported next to it. Everything stays in
//! memory; no temporary files are written.

use serde::Serialize;

use crate::documents::{analyze_document, file_extension, Analysis, DocumentKind};
use crate::export::optimize_xlsx;
use crate::normalize::NormalizeSummary;
use crate::ocr::OcrDelegate;
use crate::types::Mode;

pub const OPTIMIZED_PREFIX: &str = "AI최적화_";
pub const TEXT_PREFIX: &str = "OCR_";

/// A downloadable file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub filename: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub size: usize,
}

impl Artifact {
    pub fn new(filename: String, bytes: Vec<u8>) -> Self {
        Self {
            filename,
            size: bytes.len(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadResponse {
    pub filename: String,
    pub analysis: Analysis,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimized: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub normalize_summary: Option<NormalizeSummary>,
    /// Why the optimized spreadsheet could not be produced.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optimize_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<Artifact>,
}

/// Analyze an uploaded document and build its download artifacts.
pub fn process_upload(
    filename: &str,
    data: &[u8],
    mode: Mode,
    ocr: &dyn OcrDelegate,
) -> UploadResponse {
    let name = base_name(filename);
    let analysis = analyze_document(filename, data, mode, ocr);

    let mut response = UploadResponse {
        filename: name.to_string(),
        text: analysis
            .extracted_text
            .as_ref()
            .map(|text| Artifact::new(format!("{TEXT_PREFIX}{name}.txt"), text.clone().into_bytes())),
        analysis,
        optimized: None,
        normalize_summary: None,
        optimize_error: None,
    };

    if DocumentKind::from_extension(&file_extension(filename)) == DocumentKind::Spreadsheet {
        match optimize_xlsx(data, mode) {
            Ok((bytes, summary)) => {
                response.optimized =
                    Some(Artifact::new(format!("{OPTIMIZED_PREFIX}{name}"), bytes));
                response.normalize_summary = Some(summary);
            }
            Err(e) => {
                tracing::warn!(filename = name, error = %e, "optimization failed");
                response.optimize_error = Some(e.to_string());
            }
        }
    }

    response
}

fn base_name(filename: &str) -> &str {
    filename.rsplit(['/', '\\']).next().unwrap_or(filename)
}
