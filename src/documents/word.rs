//! Word-processor documents: count body-level tables.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;
use crate::types::{AuditResult, Finding, FindingKind, Mode};

use super::read_main_part;

const DEFAULT_MAIN_PART: &str = "word/document.xml";

/// Warn when the document contains tables. Never deducts.
pub fn check_word(data: &[u8], file_type: &str, mode: Mode) -> Result<AuditResult> {
    let xml = read_main_part(data, DEFAULT_MAIN_PART)?;
    let tables = count_tables(&xml)?;
    tracing::debug!(tables, "counted word tables");

    let mut result = AuditResult::new(file_type, mode);
    if tables > 0 {
        result.warn(Finding::new(
            FindingKind::Tables,
            format!("{tables}개의 표 발견"),
        ));
    }
    Ok(result.finish())
}

/// Count `<w:tbl>` elements that are not nested inside another table.
pub fn count_tables(xml: &[u8]) -> Result<usize> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut depth = 0usize;
    let mut count = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"tbl" => {
                if depth == 0 {
                    count += 1;
                }
                depth += 1;
            }
            Event::Empty(e) if e.local_name().as_ref() == b"tbl" => {
                if depth == 0 {
                    count += 1;
                }
            }
            Event::End(e) if e.local_name().as_ref() == b"tbl" => {
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(count)
}
