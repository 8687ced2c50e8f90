//! Parsing of xl/styles.xml
//!
//! Reads the font, fill, border and `cellXfs` tables into the records cells
//! resolve their style bundles from. Number formats, named styles and dxfs are
//! left in the XML untouched.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::io::BufRead;

use crate::error::Result;
use crate::types::{
    Alignment, Border, BorderSide, CellXf, Color, Fill, Font, GradientStop, Protection,
    StyleSheet,
};
use crate::xml_helpers::{
    attr_bool, attr_f64, attr_i32, attr_string, attr_u32, attr_val, collect_attrs,
    parse_color_attrs,
};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
    Diagonal,
}

impl Side {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"left" | b"start" => Some(Self::Left),
            b"right" | b"end" => Some(Self::Right),
            b"top" => Some(Self::Top),
            b"bottom" => Some(Self::Bottom),
            b"diagonal" => Some(Self::Diagonal),
            _ => None,
        }
    }

    fn slot(self, border: &mut Border) -> &mut Option<BorderSide> {
        match self {
            Self::Left => &mut border.left,
            Self::Right => &mut border.right,
            Self::Top => &mut border.top,
            Self::Bottom => &mut border.bottom,
            Self::Diagonal => &mut border.diagonal,
        }
    }
}

/// Parse styles.xml content
#[allow(clippy::too_many_lines)]
pub fn parse_styles<R: BufRead>(reader: R) -> Result<StyleSheet> {
    let mut xml = Reader::from_reader(reader);
    xml.trim_text(true);

    let mut stylesheet = StyleSheet::default();
    let mut buf = Vec::new();

    let mut section = Section::None;
    let mut current_font: Option<Font> = None;
    let mut current_fill: Option<Fill> = None;
    let mut current_border: Option<Border> = None;
    let mut current_side: Option<Side> = None;
    let mut current_xf: Option<CellXf> = None;
    let mut in_stop = false;

    loop {
        match xml.read_event_into(&mut buf)? {
            ref event @ (Event::Start(ref e) | Event::Empty(ref e)) => {
                let is_empty = matches!(event, Event::Empty(_));
                let name = e.local_name();
                match name.as_ref() {
                    b"fonts" if !is_empty => section = Section::Fonts,
                    b"fills" if !is_empty => section = Section::Fills,
                    b"borders" if !is_empty => section = Section::Borders,
                    b"cellXfs" if !is_empty => section = Section::CellXfs,
                    b"cellStyleXfs" | b"dxfs" | b"cellStyles" | b"numFmts" | b"colors" => {
                        if !is_empty {
                            section = Section::None;
                        }
                    }

                    b"font" if section == Section::Fonts => {
                        if is_empty {
                            stylesheet.fonts.push(Font::default());
                        } else {
                            current_font = Some(Font::default());
                        }
                    }
                    local if current_font.is_some() => {
                        if let Some(font) = current_font.as_mut() {
                            apply_font_property(font, local, e);
                        }
                    }

                    b"fill" if section == Section::Fills => {
                        let empty_fill = Fill::Pattern {
                            pattern_type: None,
                            fg_color: None,
                            bg_color: None,
                        };
                        if is_empty {
                            stylesheet.fills.push(empty_fill);
                        } else {
                            current_fill = Some(empty_fill);
                        }
                    }
                    b"patternFill" if current_fill.is_some() => {
                        current_fill = Some(Fill::Pattern {
                            pattern_type: attr_string(e, b"patternType"),
                            fg_color: None,
                            bg_color: None,
                        });
                    }
                    b"gradientFill" if current_fill.is_some() => {
                        current_fill = Some(Fill::Gradient {
                            attrs: collect_attrs(e, &[]),
                            stops: Vec::new(),
                        });
                    }
                    b"stop" => {
                        if let Some(Fill::Gradient { stops, .. }) = current_fill.as_mut() {
                            stops.push(GradientStop {
                                position: attr_f64(e, b"position").unwrap_or(0.0),
                                color: Color::default(),
                            });
                            in_stop = !is_empty;
                        }
                    }
                    b"color" if in_stop => {
                        if let Some(Fill::Gradient { stops, .. }) = current_fill.as_mut() {
                            if let Some(stop) = stops.last_mut() {
                                stop.color = parse_color_attrs(e);
                            }
                        }
                    }
                    b"fgColor" => {
                        if let Some(Fill::Pattern { fg_color, .. }) = current_fill.as_mut() {
                            *fg_color = Some(parse_color_attrs(e));
                        }
                    }
                    b"bgColor" => {
                        if let Some(Fill::Pattern { bg_color, .. }) = current_fill.as_mut() {
                            *bg_color = Some(parse_color_attrs(e));
                        }
                    }

                    b"border" if section == Section::Borders => {
                        let border = Border {
                            diagonal_up: attr_bool(e, b"diagonalUp"),
                            diagonal_down: attr_bool(e, b"diagonalDown"),
                            outline: attr_bool(e, b"outline"),
                            ..Border::default()
                        };
                        if is_empty {
                            stylesheet.borders.push(border);
                        } else {
                            current_border = Some(border);
                        }
                    }
                    b"color" if current_side.is_some() => {
                        if let (Some(border), Some(side)) = (current_border.as_mut(), current_side)
                        {
                            if let Some(s) = side.slot(border).as_mut() {
                                s.color = Some(parse_color_attrs(e));
                            }
                        }
                    }
                    local if current_border.is_some() => {
                        if let (Some(border), Some(side)) =
                            (current_border.as_mut(), Side::from_name(local))
                        {
                            *side.slot(border) = Some(BorderSide {
                                style: attr_string(e, b"style"),
                                color: None,
                            });
                            if !is_empty {
                                current_side = Some(side);
                            }
                        }
                    }

                    b"xf" if section == Section::CellXfs => {
                        let xf = CellXf {
                            font_id: attr_u32(e, b"fontId"),
                            fill_id: attr_u32(e, b"fillId"),
                            border_id: attr_u32(e, b"borderId"),
                            num_fmt_id: attr_u32(e, b"numFmtId"),
                            xf_id: attr_u32(e, b"xfId"),
                            quote_prefix: attr_bool(e, b"quotePrefix").unwrap_or(false),
                            ..CellXf::default()
                        };
                        if is_empty {
                            stylesheet.cell_xfs.push(xf);
                        } else {
                            current_xf = Some(xf);
                        }
                    }
                    b"alignment" => {
                        if let Some(xf) = current_xf.as_mut() {
                            xf.alignment = Some(parse_alignment(e));
                        }
                    }
                    b"protection" => {
                        if let Some(xf) = current_xf.as_mut() {
                            xf.protection = Some(Protection {
                                locked: attr_bool(e, b"locked"),
                                hidden: attr_bool(e, b"hidden"),
                            });
                        }
                    }
                    _ => {}
                }
            }
            Event::End(ref e) => match e.local_name().as_ref() {
                b"fonts" | b"fills" | b"borders" | b"cellXfs" => section = Section::None,
                b"font" => {
                    if let Some(font) = current_font.take() {
                        stylesheet.fonts.push(font);
                    }
                }
                b"fill" => {
                    if let Some(fill) = current_fill.take() {
                        stylesheet.fills.push(fill);
                    }
                }
                b"stop" => in_stop = false,
                b"border" => {
                    if let Some(border) = current_border.take() {
                        stylesheet.borders.push(border);
                    }
                }
                b"xf" => {
                    if let Some(xf) = current_xf.take() {
                        stylesheet.cell_xfs.push(xf);
                    }
                }
                local if Side::from_name(local).is_some() => current_side = None,
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(stylesheet)
}

fn apply_font_property(font: &mut Font, local: &[u8], e: &BytesStart) {
    // Toggle elements may carry val="0" to switch the property off explicitly
    let flag = || attr_bool(e, b"val").unwrap_or(true);
    match local {
        b"b" => font.bold = flag(),
        b"i" => font.italic = flag(),
        b"strike" => font.strike = flag(),
        b"outline" => font.outline = flag(),
        b"shadow" => font.shadow = flag(),
        b"condense" => font.condense = flag(),
        b"extend" => font.extend = flag(),
        b"u" => font.underline = Some(attr_val(e).unwrap_or_else(|| "single".to_string())),
        b"vertAlign" => font.vert_align = attr_val(e),
        b"sz" => font.size = attr_f64(e, b"val"),
        b"color" => font.color = Some(parse_color_attrs(e)),
        b"name" | b"rFont" => font.name = attr_val(e),
        b"family" => font.family = attr_u32(e, b"val"),
        b"charset" => font.charset = attr_u32(e, b"val"),
        b"scheme" => font.scheme = attr_val(e),
        _ => {}
    }
}

fn parse_alignment(e: &BytesStart) -> Alignment {
    Alignment {
        horizontal: attr_string(e, b"horizontal"),
        vertical: attr_string(e, b"vertical"),
        wrap_text: attr_bool(e, b"wrapText"),
        shrink_to_fit: attr_bool(e, b"shrinkToFit"),
        indent: attr_u32(e, b"indent"),
        text_rotation: attr_i32(e, b"textRotation"),
        reading_order: attr_u32(e, b"readingOrder"),
        justify_last_line: attr_bool(e, b"justifyLastLine"),
        relative_indent: attr_i32(e, b"relativeIndent"),
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic
)]
mod tests {
    use super::*;

    const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="2">
    <font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
    <font><b/><i val="0"/><u/><sz val="14"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><gradientFill degree="90"><stop position="0"><color rgb="FFFFFFFF"/></stop><stop position="1"><color theme="4"/></stop></gradientFill></fill>
  </fills>
  <borders count="2">
    <border><left/><right/><top/><bottom/><diagonal/></border>
    <border diagonalUp="1"><left style="thin"><color indexed="64"/></left><right style="medium"/><top/><bottom style="double"><color auto="1"/></bottom><diagonal/></border>
  </borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="14" fontId="1" fillId="2" borderId="1" xfId="0" applyFont="1" quotePrefix="1"><alignment horizontal="center" vertical="top" wrapText="1"/><protection locked="0"/></xf>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
</styleSheet>"#;

    #[test]
    fn test_parse_tables() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();
        assert_eq!(sheet.fonts.len(), 2);
        assert_eq!(sheet.fills.len(), 3);
        assert_eq!(sheet.borders.len(), 2);
        // cellStyleXfs must not leak into cellXfs
        assert_eq!(sheet.cell_xfs.len(), 2);
    }

    #[test]
    fn test_parse_font_properties() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();
        let font = &sheet.fonts[1];
        assert!(font.bold);
        assert!(!font.italic);
        assert_eq!(font.underline.as_deref(), Some("single"));
        assert_eq!(font.size, Some(14.0));
        assert_eq!(font.color, Some(Color::rgb("FFFF0000")));
        assert_eq!(sheet.fonts[0].scheme.as_deref(), Some("minor"));
    }

    #[test]
    fn test_parse_fills_and_borders() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();
        match &sheet.fills[2] {
            Fill::Gradient { attrs, stops } => {
                assert_eq!(attrs, &vec![("degree".to_string(), "90".to_string())]);
                assert_eq!(stops.len(), 2);
                assert_eq!(stops[1].color.theme, Some(4));
            }
            Fill::Pattern { .. } => panic!("expected gradient fill"),
        }

        let border = &sheet.borders[1];
        assert_eq!(border.diagonal_up, Some(true));
        let left = border.left.as_ref().unwrap();
        assert_eq!(left.style.as_deref(), Some("thin"));
        assert_eq!(left.color.as_ref().unwrap().indexed, Some(64));
        assert_eq!(border.top, Some(BorderSide::default()));
        assert_eq!(
            border.bottom.as_ref().unwrap().color.as_ref().unwrap().auto,
            Some(true)
        );
    }

    #[test]
    fn test_parse_xf_alignment_and_protection() {
        let sheet = parse_styles(STYLES.as_bytes()).unwrap();
        let style = sheet.resolve(1).unwrap();
        let alignment = style.alignment.unwrap();
        assert_eq!(alignment.horizontal.as_deref(), Some("center"));
        assert_eq!(alignment.wrap_text, Some(true));
        assert_eq!(style.protection.unwrap().locked, Some(false));
        assert_eq!(style.num_fmt_id, Some(14));
        assert!(style.quote_prefix);
        assert!(style.font.unwrap().bold);
    }
}
