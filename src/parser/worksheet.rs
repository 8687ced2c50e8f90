//! Worksheet parsing - parses individual sheet XML into the grid model.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::BTreeSet;
use std::io::{BufRead, BufReader, Read, Seek};
use zip::ZipArchive;

use crate::cell_ref::{parse_cell_range, parse_cell_ref_bytes, RefShifter};
use crate::error::Result;
use crate::types::{
    Cell, CellStyle, CellValue, ColSpan, Formula, MergeRegion, RowProps, Sheet, StyleSheet,
};
use crate::xml_helpers::{attr_bool, attr_string, attr_u32, collect_attrs};

use super::relationships::SheetInfo;

/// Cell type tag from the `t` attribute of a `<c>` element.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(super) enum CellTypeTag {
    Shared,
    Inline,
    Str,
    Bool,
    Error,
    Date,
    Number,
}

pub(super) fn parse_cell_type_tag(value: &[u8]) -> CellTypeTag {
    match value {
        b"s" => CellTypeTag::Shared,
        b"b" => CellTypeTag::Bool,
        b"e" => CellTypeTag::Error,
        b"str" => CellTypeTag::Str,
        b"inlineStr" => CellTypeTag::Inline,
        b"d" => CellTypeTag::Date,
        _ => CellTypeTag::Number,
    }
}

/// Which text-bearing child of `<c>` we are inside.
#[derive(Copy, Clone, PartialEq, Eq)]
enum TextTarget {
    None,
    Value,
    Formula,
    InlineText,
}

/// A `<c>` element under construction.
struct PendingCell {
    row: u32,
    col: u32,
    tag: CellTypeTag,
    style_idx: Option<u32>,
    extra_attrs: Vec<(String, String)>,
    raw_value: Option<String>,
    inline_text: Option<String>,
    formula: Option<Formula>,
}

impl PendingCell {
    fn finish(self, shared_strings: &[String], styles: &StyleSheet, default: &CellStyle) -> Cell {
        let mut shared_index = None;
        let value = match self.tag {
            CellTypeTag::Shared => self
                .raw_value
                .as_deref()
                .and_then(|v| v.trim().parse::<u32>().ok())
                .and_then(|idx| {
                    let text = shared_strings.get(idx as usize)?;
                    shared_index = Some(idx);
                    Some(CellValue::String(text.clone()))
                }),
            CellTypeTag::Inline => self
                .inline_text
                .or(self.raw_value)
                .map(CellValue::String),
            CellTypeTag::Str => self.raw_value.map(CellValue::String),
            CellTypeTag::Bool => self
                .raw_value
                .map(|v| CellValue::Boolean(matches!(v.trim(), "1" | "true"))),
            CellTypeTag::Error => self.raw_value.map(CellValue::Error),
            CellTypeTag::Date => self.raw_value.map(CellValue::Date),
            CellTypeTag::Number => self.raw_value.map(|v| match v.trim().parse::<f64>() {
                Ok(n) => CellValue::Number(n),
                Err(_) => CellValue::String(v),
            }),
        };

        let style = self
            .style_idx
            .and_then(|idx| styles.resolve(idx))
            .unwrap_or_else(|| default.clone());

        Cell {
            value,
            style,
            style_idx: self.style_idx,
            shared_index,
            formula: self.formula,
            extra_attrs: self.extra_attrs,
        }
    }
}

/// Parse a single worksheet part from the archive.
pub(super) fn parse_sheet<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    info: &SheetInfo,
    shared_strings: &[String],
    styles: &StyleSheet,
) -> Result<Sheet> {
    let file = archive.by_name(&info.path)?;
    let mut sheet = parse_worksheet(BufReader::new(file), shared_strings, styles)?;
    sheet.name.clone_from(&info.name);
    sheet.path.clone_from(&info.path);
    Ok(sheet)
}

/// Parse worksheet XML into a [`Sheet`] (name and path left empty).
///
/// Covered cells of merge regions are loaded without a value or formula: in
/// the file format only the top-left cell of a region carries one.
#[allow(clippy::too_many_lines)]
pub fn parse_worksheet<R: BufRead>(
    reader: R,
    shared_strings: &[String],
    styles: &StyleSheet,
) -> Result<Sheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(false);

    let default_style = styles.default_style();
    let mut sheet = Sheet::default();
    let mut buf = Vec::new();

    let mut current_row: u32 = 0;
    let mut last_col: u32 = 0;
    let mut pending: Option<PendingCell> = None;
    let mut target = TextTarget::None;
    let mut text = String::new();
    let mut in_phonetic = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                match e.local_name().as_ref() {
                    b"col" => sheet.cols.push(parse_col(e)),
                    b"row" => {
                        current_row = attr_u32(e, b"r").unwrap_or(current_row + 1);
                        last_col = 0;
                        let props = RowProps {
                            hidden: attr_bool(e, b"hidden").unwrap_or(false),
                            attrs: collect_attrs(e, &[b"r", b"spans", b"hidden"]),
                        };
                        if props.hidden || !props.attrs.is_empty() {
                            sheet.rows.insert(current_row, props);
                        }
                    }
                    b"c" => {
                        let (col, row) = e
                            .try_get_attribute("r")
                            .ok()
                            .flatten()
                            .and_then(|a| parse_cell_ref_bytes(&a.value))
                            .unwrap_or((last_col + 1, current_row.max(1)));
                        last_col = col;
                        let cell = PendingCell {
                            row,
                            col,
                            tag: e
                                .try_get_attribute("t")
                                .ok()
                                .flatten()
                                .map_or(CellTypeTag::Number, |a| parse_cell_type_tag(&a.value)),
                            style_idx: attr_u32(e, b"s"),
                            extra_attrs: collect_attrs(e, &[b"r", b"s", b"t"]),
                            raw_value: None,
                            inline_text: None,
                            formula: None,
                        };
                        if is_empty {
                            let cell = cell.finish(shared_strings, styles, &default_style);
                            sheet.cells.insert((row, col), cell);
                        } else {
                            pending = Some(cell);
                        }
                    }
                    b"v" if pending.is_some() && !is_empty => {
                        target = TextTarget::Value;
                        text.clear();
                    }
                    b"f" => {
                        if let Some(cell) = pending.as_mut() {
                            cell.formula = Some(Formula {
                                text: String::new(),
                                attrs: collect_attrs(e, &[]),
                            });
                            if !is_empty {
                                target = TextTarget::Formula;
                                text.clear();
                            }
                        }
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if pending.is_some() && !is_empty && !in_phonetic => {
                        target = TextTarget::InlineText;
                        text.clear();
                    }
                    b"mergeCell" => {
                        if let Some(region) = attr_string(e, b"ref")
                            .as_deref()
                            .and_then(parse_cell_range)
                            .map(|(r1, c1, r2, c2)| MergeRegion::new(r1, c1, r2, c2))
                        {
                            sheet.merges.push(region);
                        }
                    }
                    _ => {}
                }
            }
            Event::Text(ref e) if target != TextTarget::None => text.push_str(&e.unescape()?),
            Event::CData(ref e) if target != TextTarget::None => {
                text.push_str(&String::from_utf8_lossy(e.as_ref()));
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"v" | b"f" | b"t" if target != TextTarget::None => {
                    if let Some(cell) = pending.as_mut() {
                        let value = std::mem::take(&mut text);
                        match target {
                            TextTarget::Value => cell.raw_value = Some(value),
                            TextTarget::Formula => {
                                if let Some(f) = cell.formula.as_mut() {
                                    f.text = value;
                                }
                            }
                            TextTarget::InlineText => {
                                cell.inline_text
                                    .get_or_insert_with(String::new)
                                    .push_str(&value);
                            }
                            TextTarget::None => {}
                        }
                    }
                    target = TextTarget::None;
                }
                b"rPh" => in_phonetic = false,
                b"c" => {
                    if let Some(cell) = pending.take() {
                        let key = (cell.row, cell.col);
                        sheet
                            .cells
                            .insert(key, cell.finish(shared_strings, styles, &default_style));
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    clear_merge_placeholders(&mut sheet)?;
    sheet.update_extent();
    Ok(sheet)
}

fn parse_col(e: &BytesStart) -> ColSpan {
    let min = attr_u32(e, b"min").unwrap_or(1);
    ColSpan {
        min,
        max: attr_u32(e, b"max").unwrap_or(min).max(min),
        hidden: attr_bool(e, b"hidden").unwrap_or(false),
        attrs: collect_attrs(e, &[b"min", b"max", b"hidden"]),
    }
}

/// Drop values from every covered (non-source) cell of each merge region.
///
/// A covered cell can be the master of a shared formula whose members lie
/// outside the region. Each such member gets the master's formula moved to
/// its own position and stops being a shared member.
fn clear_merge_placeholders(sheet: &mut Sheet) -> Result<()> {
    let covered: BTreeSet<(u32, u32)> = sheet
        .merges
        .iter()
        .flat_map(|region| {
            let source = region.source();
            region.positions().filter(move |&pos| pos != source)
        })
        .collect();

    let masters: Vec<((u32, u32), String, String)> = covered
        .iter()
        .filter_map(|pos| {
            let formula = sheet.cells.get(pos)?.formula.as_ref()?;
            let si = formula.shared_master_index()?;
            Some((*pos, si.to_string(), formula.text.clone()))
        })
        .collect();
    if !masters.is_empty() {
        let shifter = RefShifter::new()?;
        for ((master_row, master_col), si, text) in &masters {
            for (&(row, col), cell) in sheet.cells.iter_mut() {
                if covered.contains(&(row, col)) {
                    continue;
                }
                let Some(formula) = cell.formula.as_mut() else {
                    continue;
                };
                if !formula.is_shared_child() || formula.attr("si") != Some(si.as_str()) {
                    continue;
                }
                formula.text = shifter.shift(
                    text,
                    i64::from(row) - i64::from(*master_row),
                    i64::from(col) - i64::from(*master_col),
                );
                formula
                    .attrs
                    .retain(|(k, _)| !matches!(k.as_str(), "t" | "si" | "ref"));
            }
            tracing::debug!(si = %si, "expanded shared formula whose master is merged away");
        }
    }

    for pos in &covered {
        if let Some(cell) = sheet.cells.get_mut(pos) {
            cell.value = None;
            cell.formula = None;
            cell.shared_index = None;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp
)]
mod tests {
    use super::*;

    fn parse(body: &str) -> Sheet {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">{body}</worksheet>"#
        );
        let shared = vec!["alpha".to_string(), "line\nbreak".to_string()];
        parse_worksheet(xml.as_bytes(), &shared, &StyleSheet::default()).unwrap()
    }

    #[test]
    fn test_cell_types() {
        let sheet = parse(
            r#"<sheetData><row r="1">
                <c r="A1" t="s"><v>1</v></c>
                <c r="B1"><v>3.25</v></c>
                <c r="C1" t="b"><v>1</v></c>
                <c r="D1" t="inlineStr"><is><t>in</t></is></c>
                <c r="E1" t="str"><f>A1&amp;"x"</f><v>res</v></c>
                <c r="F1" t="e"><v>#DIV/0!</v></c>
            </row></sheetData>"#,
        );
        assert_eq!(sheet.value(1, 1), Some(&CellValue::from("line\nbreak")));
        assert_eq!(sheet.cell(1, 1).unwrap().shared_index, Some(1));
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Number(3.25)));
        assert_eq!(sheet.value(1, 3), Some(&CellValue::Boolean(true)));
        assert_eq!(sheet.value(1, 4), Some(&CellValue::from("in")));
        let formula = sheet.cell(1, 5).unwrap().formula.as_ref().unwrap();
        assert_eq!(formula.text, "A1&\"x\"");
        assert_eq!(sheet.value(1, 6), Some(&CellValue::Error("#DIV/0!".into())));
        assert_eq!((sheet.max_row, sheet.max_col), (1, 6));
    }

    #[test]
    fn test_rows_cols_and_merges() {
        let sheet = parse(
            r#"<cols><col min="2" max="3" width="12" hidden="1" customWidth="1"/></cols>
            <sheetData>
              <row r="1" spans="1:3"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>9</v></c></row>
              <row r="2" hidden="1" ht="0"><c r="A2"><v>1</v></c></row>
            </sheetData>
            <mergeCells count="1"><mergeCell ref="A1:B2"/></mergeCells>"#,
        );
        assert_eq!(sheet.merges, vec![MergeRegion::new(1, 1, 2, 2)]);
        // Covered cells hold no value of their own
        assert_eq!(sheet.value(1, 2), None);
        assert_eq!(sheet.value(2, 1), None);
        assert_eq!(sheet.value(1, 1), Some(&CellValue::from("alpha")));

        assert!(sheet.is_row_hidden(2));
        assert_eq!(sheet.rows[&2].attrs, vec![("ht".to_string(), "0".to_string())]);
        // spans is regenerated on write, not kept
        assert!(!sheet.rows.contains_key(&1));

        assert_eq!(sheet.cols.len(), 1);
        assert!(sheet.is_col_hidden(3));
        assert_eq!(sheet.hidden_col_count(), 1);
        assert_eq!(sheet.hidden_row_count(), 1);
    }

    #[test]
    fn test_missing_refs_are_positional() {
        let sheet = parse(r#"<sheetData><row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row></sheetData>"#);
        assert_eq!(sheet.value(1, 2), Some(&CellValue::Number(2.0)));
        assert_eq!(sheet.value(2, 1), Some(&CellValue::Number(3.0)));
    }

    #[test]
    fn test_inline_string_skips_phonetic_runs() {
        let sheet = parse(
            r#"<sheetData><row r="1"><c r="A1" t="inlineStr"><is><r><t>a</t></r><r><t>b</t></r><rPh><t>x</t></rPh></is></c></row></sheetData>"#,
        );
        assert_eq!(sheet.value(1, 1), Some(&CellValue::from("ab")));
    }

    #[test]
    fn test_merged_away_shared_master_expands_members() {
        let sheet = parse(
            r#"<sheetData>
              <row r="1"><c r="A1"><v>1</v></c><c r="B1"><f t="shared" ref="B1:B3" si="0">A1*2</f><v>2</v></c></row>
              <row r="2"><c r="A2"><v>2</v></c><c r="B2"><f t="shared" si="0"/><v>4</v></c></row>
              <row r="3"><c r="A3"><v>3</v></c><c r="B3"><f t="shared" si="0"/><v>6</v></c></row>
            </sheetData>
            <mergeCells count="1"><mergeCell ref="A1:B1"/></mergeCells>"#,
        );
        assert!(sheet.cell(1, 2).unwrap().formula.is_none());

        let b2 = sheet.cell(2, 2).unwrap().formula.as_ref().unwrap();
        assert_eq!(b2.text, "A2*2");
        assert!(b2.attrs.is_empty());
        let b3 = sheet.cell(3, 2).unwrap().formula.as_ref().unwrap();
        assert_eq!(b3.text, "A3*2");
        assert_eq!(sheet.value(3, 2), Some(&CellValue::Number(6.0)));
    }

    #[test]
    fn test_shared_group_with_visible_master_is_kept() {
        let sheet = parse(
            r#"<sheetData>
              <row r="1"><c r="B1"><f t="shared" ref="B1:B2" si="3">A1+1</f><v>1</v></c></row>
              <row r="2"><c r="B2"><f t="shared" si="3"/><v>1</v></c></row>
            </sheetData>
            <mergeCells count="1"><mergeCell ref="C1:D1"/></mergeCells>"#,
        );
        let b2 = sheet.cell(2, 2).unwrap().formula.as_ref().unwrap();
        assert!(b2.is_shared_child());
        assert_eq!(b2.attr("si"), Some("3"));
    }
}
