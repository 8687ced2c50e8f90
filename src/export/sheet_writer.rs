//! Rewrites worksheet XML from a `Sheet`.
//!
//! The original part is streamed through and only `sheetData`, `cols`,
//! `mergeCells` and `dimension` are regenerated from the model, so views,
//! page setup, conditional formats, drawings and extension lists survive
//! untouched. Strings that still match their shared-string entry keep the
//! `t="s"` reference; changed strings are written as inline strings
//! (`t="inlineStr"`), avoiding a rebuild of the shared string table.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::collections::BTreeSet;

use crate::cell_ref::{cell_label, range_label};
use crate::error::Result;
use crate::types::{Cell, CellValue, Sheet};
use crate::xml_helpers::{name_prefix, push_attrs, qualified, xml_escape};

use super::styles_writer::StyleInterner;

/// Produce the new worksheet XML for `sheet`, using `original` as the template.
pub(crate) fn write_sheet_xml(
    original: &[u8],
    sheet: &Sheet,
    shared_strings: &[String],
    styles: &mut StyleInterner<'_>,
) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(original);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(original.len() + 4096));
    let mut prefix: Option<String> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"worksheet" => {
                    prefix = name_prefix(&e);
                    writer.write_event(Event::Start(e))?;
                }
                b"sheetData" => {
                    reader.read_to_end(e.name())?;
                    let xml = sheet_data_xml(sheet, shared_strings, styles, prefix.as_deref());
                    writer.get_mut().extend_from_slice(xml.as_bytes());
                }
                b"cols" => {
                    reader.read_to_end(e.name())?;
                    let xml = cols_xml(sheet, prefix.as_deref());
                    writer.get_mut().extend_from_slice(xml.as_bytes());
                }
                b"mergeCells" => {
                    reader.read_to_end(e.name())?;
                    let xml = merge_cells_xml(sheet, prefix.as_deref());
                    writer.get_mut().extend_from_slice(xml.as_bytes());
                }
                _ => writer.write_event(Event::Start(e))?,
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"sheetData" => {
                    let xml = sheet_data_xml(sheet, shared_strings, styles, prefix.as_deref());
                    writer.get_mut().extend_from_slice(xml.as_bytes());
                }
                b"cols" => {
                    let xml = cols_xml(sheet, prefix.as_deref());
                    writer.get_mut().extend_from_slice(xml.as_bytes());
                }
                b"mergeCells" => {
                    let xml = merge_cells_xml(sheet, prefix.as_deref());
                    writer.get_mut().extend_from_slice(xml.as_bytes());
                }
                b"dimension" => writer.write_event(Event::Empty(dimension(&e, sheet)))?,
                _ => writer.write_event(Event::Empty(e))?,
            },
            Event::Eof => break,
            event => writer.write_event(event)?,
        }
    }

    Ok(writer.into_inner())
}

/// `<dimension>` with its `ref` recomputed from the model.
fn dimension(e: &BytesStart, sheet: &Sheet) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);

    let mut min_row = sheet.max_row;
    let mut min_col = sheet.max_col;
    for &(row, col) in sheet.cells.keys() {
        min_row = min_row.min(row);
        min_col = min_col.min(col);
    }
    let reference = if sheet.cells.is_empty() {
        "A1".to_string()
    } else {
        range_label(min_row.max(1), min_col.max(1), sheet.max_row, sheet.max_col)
    };

    out.push_attribute(("ref", reference.as_str()));
    out
}

fn sheet_data_xml(
    sheet: &Sheet,
    shared_strings: &[String],
    styles: &mut StyleInterner<'_>,
    prefix: Option<&str>,
) -> String {
    let sheet_data = qualified(prefix, "sheetData");
    let row_tag = qualified(prefix, "row");

    let row_numbers: BTreeSet<u32> = sheet
        .cells
        .keys()
        .map(|&(row, _)| row)
        .chain(sheet.rows.keys().copied())
        .collect();

    if row_numbers.is_empty() {
        return format!("<{sheet_data}/>");
    }

    let mut out = String::with_capacity(sheet.cells.len() * 32);
    out.push_str(&format!("<{sheet_data}>"));

    for row in row_numbers {
        out.push_str(&format!("<{row_tag} r=\"{row}\""));
        if let Some(props) = sheet.rows.get(&row) {
            push_attrs(&mut out, &props.attrs);
            if props.hidden {
                out.push_str(" hidden=\"1\"");
            }
        }

        let mut cells = sheet.cells.range((row, 0)..=(row, u32::MAX)).peekable();
        if cells.peek().is_none() {
            out.push_str("/>");
            continue;
        }
        out.push('>');
        for (&(r, c), cell) in cells {
            let s = styles.attr_for(cell);
            write_cell(&mut out, r, c, cell, s, shared_strings, prefix);
        }
        out.push_str(&format!("</{row_tag}>"));
    }

    out.push_str(&format!("</{sheet_data}>"));
    out
}

/// Write a single `<c>` element.
fn write_cell(
    out: &mut String,
    row: u32,
    col: u32,
    cell: &Cell,
    style: Option<u32>,
    shared_strings: &[String],
    prefix: Option<&str>,
) {
    let c_tag = qualified(prefix, "c");
    let v_tag = qualified(prefix, "v");

    out.push_str(&format!("<{c_tag} r=\"{}\"", cell_label(row, col)));
    if let Some(s) = style {
        out.push_str(&format!(" s=\"{s}\""));
    }

    // (type attribute, <v> content) or an inline string body
    enum Body<'a> {
        None,
        Value(&'a str, String),
        Inline(&'a str),
    }

    let body = match &cell.value {
        None => Body::None,
        Some(CellValue::String(text)) => {
            let shared = cell
                .shared_index
                .filter(|&idx| shared_strings.get(idx as usize) == Some(text));
            match (shared, &cell.formula) {
                (_, Some(_)) => Body::Value("str", xml_escape(text)),
                (Some(idx), None) => Body::Value("s", idx.to_string()),
                (None, None) => Body::Inline(text),
            }
        }
        Some(CellValue::Number(n)) => Body::Value("", n.to_string()),
        Some(CellValue::Boolean(b)) => Body::Value("b", if *b { "1" } else { "0" }.to_string()),
        Some(CellValue::Error(e)) => Body::Value("e", xml_escape(e)),
        Some(CellValue::Date(d)) => Body::Value("d", xml_escape(d)),
    };

    match &body {
        Body::Value(t, _) if !t.is_empty() => out.push_str(&format!(" t=\"{t}\"")),
        Body::Inline(_) => out.push_str(" t=\"inlineStr\""),
        _ => {}
    }
    push_attrs(out, &cell.extra_attrs);

    if matches!(body, Body::None) && cell.formula.is_none() {
        out.push_str("/>");
        return;
    }
    out.push('>');

    if let Some(formula) = &cell.formula {
        let f_tag = qualified(prefix, "f");
        out.push_str(&format!("<{f_tag}"));
        push_attrs(out, &formula.attrs);
        if formula.text.is_empty() {
            out.push_str("/>");
        } else {
            out.push('>');
            out.push_str(&xml_escape(&formula.text));
            out.push_str(&format!("</{f_tag}>"));
        }
    }

    match body {
        Body::Value(_, v) => out.push_str(&format!("<{v_tag}>{v}</{v_tag}>")),
        Body::Inline(text) => {
            let is_tag = qualified(prefix, "is");
            let t_tag = qualified(prefix, "t");
            let space = if text.trim() == text {
                ""
            } else {
                " xml:space=\"preserve\""
            };
            out.push_str(&format!(
                "<{is_tag}><{t_tag}{space}>{}</{t_tag}></{is_tag}>",
                xml_escape(text)
            ));
        }
        Body::None => {}
    }

    out.push_str(&format!("</{c_tag}>"));
}

fn cols_xml(sheet: &Sheet, prefix: Option<&str>) -> String {
    if sheet.cols.is_empty() {
        return String::new();
    }
    let cols = qualified(prefix, "cols");
    let col = qualified(prefix, "col");
    let mut out = format!("<{cols}>");
    for span in &sheet.cols {
        out.push_str(&format!("<{col} min=\"{}\" max=\"{}\"", span.min, span.max));
        push_attrs(&mut out, &span.attrs);
        if span.hidden {
            out.push_str(" hidden=\"1\"");
        }
        out.push_str("/>");
    }
    out.push_str(&format!("</{cols}>"));
    out
}

fn merge_cells_xml(sheet: &Sheet, prefix: Option<&str>) -> String {
    if sheet.merges.is_empty() {
        return String::new();
    }
    let merge_cells = qualified(prefix, "mergeCells");
    let merge_cell = qualified(prefix, "mergeCell");
    let mut out = format!("<{merge_cells} count=\"{}\">", sheet.merges.len());
    for region in &sheet.merges {
        out.push_str(&format!(
            "<{merge_cell} ref=\"{}\"/>",
            range_label(region.min_row, region.min_col, region.max_row, region.max_col)
        ));
    }
    out.push_str(&format!("</{merge_cells}>"));
    out
}
