//! Raster images. The score is fixed by the OCR outcome instead of deducted.

use crate::ocr::{OcrDelegate, OcrOutcome};
use crate::types::{AuditResult, Finding, FindingKind, Mode};

use super::pdf::NO_KEY_WARNING;
use super::Analysis;

pub const UNAVAILABLE_SCORE: i32 = 50;
pub const SUCCESS_SCORE: i32 = 75;
pub const FAILURE_SCORE: i32 = 30;

pub fn check_image(data: &[u8], file_type: &str, mode: Mode, ocr: &dyn OcrDelegate) -> Analysis {
    let mut result = AuditResult::new(file_type, mode);

    let outcome = if ocr.is_available() {
        ocr.recognize(data)
    } else {
        OcrOutcome::Unavailable
    };

    let extracted_text = match outcome {
        OcrOutcome::Text(text) if !text.trim().is_empty() => {
            result.score = SUCCESS_SCORE;
            result.warn(Finding::new(
                FindingKind::ImageOcr,
                "Claude OCR로 텍스트 추출 완료",
            ));
            Some(text)
        }
        OcrOutcome::Unavailable => {
            result.score = UNAVAILABLE_SCORE;
            result.warn(Finding::new(FindingKind::NoApiKey, NO_KEY_WARNING));
            None
        }
        OcrOutcome::Text(_) => {
            result.score = FAILURE_SCORE;
            result.issue(Finding::new(FindingKind::OcrFailed, "텍스트 추출 실패"));
            None
        }
        OcrOutcome::Failed(cause) => {
            result.score = FAILURE_SCORE;
            result.issue(Finding::new(
                FindingKind::OcrFailed,
                format!("텍스트 추출 실패 ({cause})"),
            ));
            None
        }
    };

    Analysis {
        result: result.finish(),
        extracted_text,
    }
}
