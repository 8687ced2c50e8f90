//! doccheck - document quality checker
//!
//! Scores office documents against a fixed set of formatting rules and
//! produces a cleaned copy of spreadsheets:
//! - Merged cells, hidden rows/columns and embedded line breaks in XLSX
//! - Merge flattening with style propagation, line-break stripping, unhiding
//! - Optional status-symbol recoding (analysis mode)
//! - Table/slide counts for Word and PowerPoint, text checks for PDF
//! - OCR of scanned PDFs and images through a pluggable delegate
//!
//! # Usage
//!
//! ```no_run
//! use doccheck::{analyze_document, optimize_xlsx, Mode, NoOcr};
//!
//! let data = std::fs::read("report.xlsx")?;
//! let analysis = analyze_document("report.xlsx", &data, Mode::Standard, &NoOcr);
//! println!("{} ({:?})", analysis.result.score, analysis.result.grade);
//!
//! let (cleaned, _summary) = optimize_xlsx(&data, Mode::Standard)?;
//! std::fs::write("report.clean.xlsx", cleaned)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod audit;
pub mod cell_ref;
pub mod config;
pub mod documents;
pub mod error;
pub mod export;
pub mod normalize;
pub mod ocr;
pub mod parser;
pub mod styles;
pub mod types;
pub mod upload;
pub mod xml_helpers;

pub use audit::{audit, audit_bytes, audit_with};
pub use config::Config;
pub use documents::{analyze_document, Analysis, DocumentKind};
pub use error::{DocCheckError, Result};
pub use export::{optimize_xlsx, save_xlsx};
pub use normalize::{normalize, NormalizeSummary};
pub use ocr::{ClaudeOcr, NoOcr, OcrDelegate, OcrOutcome};
pub use parser::parse;
pub use upload::{process_upload, UploadResponse};

pub use types::*;
