//! Presentations: penalize very long decks.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::Result;
use crate::types::{AuditResult, Finding, FindingKind, Mode};

use super::read_main_part;

const DEFAULT_MAIN_PART: &str = "ppt/presentation.xml";

/// Decks with more slides than this lose [`SLIDE_PENALTY`] points.
pub const SLIDE_LIMIT: usize = 50;
pub const SLIDE_PENALTY: u32 = 10;

pub fn check_slides(data: &[u8], file_type: &str, mode: Mode) -> Result<AuditResult> {
    let xml = read_main_part(data, DEFAULT_MAIN_PART)?;
    let slides = count_slides(&xml)?;
    tracing::debug!(slides, "counted slides");

    let mut result = AuditResult::new(file_type, mode);
    if slides > SLIDE_LIMIT {
        result.deduct(SLIDE_PENALTY);
        result.warn(Finding::new(
            FindingKind::ManySlides,
            format!("{slides}개의 슬라이드"),
        ));
    }
    Ok(result.finish())
}

/// Count `<p:sldId>` entries in the presentation's slide list.
pub fn count_slides(xml: &[u8]) -> Result<usize> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(true);
    let mut in_list = false;
    let mut count = 0usize;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"sldIdLst" => in_list = true,
            Event::End(e) if e.local_name().as_ref() == b"sldIdLst" => in_list = false,
            Event::Start(e) | Event::Empty(e)
                if in_list && e.local_name().as_ref() == b"sldId" =>
            {
                count += 1;
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(count)
}
