//! Style interning and styles.xml patching.
//!
//! Cells whose style still matches the `cellXfs` record they were loaded with
//! keep that index. Any other style is looked up among the existing records
//! and, failing that, appended as new font/fill/border/xf records. styles.xml is
//! only rewritten when something was appended, and then only by inserting the
//! new records at the end of their tables and updating the `count` attributes.

use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::Result;
use crate::types::{
    Alignment, Border, BorderSide, Cell, CellStyle, CellXf, Color, Fill, Font, Protection,
    StyleSheet,
};
use crate::xml_helpers::{push_attrs, xml_escape};

/// Maps cell style bundles to `cellXfs` indices, appending records as needed.
pub(crate) struct StyleInterner<'a> {
    base: &'a StyleSheet,
    default_style: CellStyle,
    fonts: Vec<Font>,
    fills: Vec<Fill>,
    borders: Vec<Border>,
    xfs: Vec<CellXf>,
    /// Styles resolved so far, with the index they were given.
    seen: Vec<(CellStyle, u32)>,
}

fn index_of(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

impl<'a> StyleInterner<'a> {
    pub(crate) fn new(base: &'a StyleSheet) -> Self {
        Self {
            base,
            default_style: base.default_style(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            xfs: Vec::new(),
            seen: Vec::new(),
        }
    }

    /// True when records were appended and styles.xml must be patched.
    pub(crate) fn has_additions(&self) -> bool {
        !(self.fonts.is_empty()
            && self.fills.is_empty()
            && self.borders.is_empty()
            && self.xfs.is_empty())
    }

    /// `cellXfs` index for a cell's current style.
    pub(crate) fn index_for(&mut self, cell: &Cell) -> u32 {
        if let Some(idx) = cell.style_idx {
            if self.base.resolve(idx).as_ref() == Some(&cell.style) {
                return idx;
            }
        }
        if let Some((_, idx)) = self.seen.iter().find(|(style, _)| style == &cell.style) {
            return *idx;
        }
        let idx = self.intern(&cell.style);
        self.seen.push((cell.style.clone(), idx));
        idx
    }

    /// Like [`Self::index_for`] but omits the attribute for unstyled default cells.
    pub(crate) fn attr_for(&mut self, cell: &Cell) -> Option<u32> {
        if cell.style_idx.is_none() && cell.style == self.default_style {
            return None;
        }
        Some(self.index_for(cell))
    }

    fn intern(&mut self, style: &CellStyle) -> u32 {
        let existing = (0..index_of(self.base.cell_xfs.len()))
            .find(|&idx| self.base.resolve(idx).as_ref() == Some(style));
        if let Some(idx) = existing {
            return idx;
        }

        let base = self.base;
        let font_id = style
            .font
            .as_ref()
            .map(|f| find_or_append(&base.fonts, &mut self.fonts, f));
        let fill_id = style
            .fill
            .as_ref()
            .map(|f| find_or_append(&base.fills, &mut self.fills, f));
        let border_id = style
            .border
            .as_ref()
            .map(|b| find_or_append(&base.borders, &mut self.borders, b));

        self.xfs.push(CellXf {
            font_id,
            fill_id,
            border_id,
            num_fmt_id: style.num_fmt_id,
            xf_id: style.xf_id,
            alignment: style.alignment.clone(),
            protection: style.protection,
            quote_prefix: style.quote_prefix,
        });
        index_of(self.base.cell_xfs.len() + self.xfs.len() - 1)
    }

    /// Rewrite styles.xml with the appended records.
    pub(crate) fn patch_styles_xml(&self, original: &[u8]) -> Result<Vec<u8>> {
        let tables: [(&[u8], usize, String); 4] = [
            (
                b"fonts",
                self.base.fonts.len() + self.fonts.len(),
                self.fonts.iter().map(font_xml).collect(),
            ),
            (
                b"fills",
                self.base.fills.len() + self.fills.len(),
                self.fills.iter().map(fill_xml).collect(),
            ),
            (
                b"borders",
                self.base.borders.len() + self.borders.len(),
                self.borders.iter().map(border_xml).collect(),
            ),
            (
                b"cellXfs",
                self.base.cell_xfs.len() + self.xfs.len(),
                self.xfs.iter().map(xf_xml).collect(),
            ),
        ];

        let mut reader = Reader::from_reader(original);
        reader.trim_text(false);
        let mut writer = Writer::new(Vec::with_capacity(original.len() + 1024));
        let mut prefix: Option<String> = None;

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    if prefix.is_none() && e.local_name().as_ref() == b"styleSheet" {
                        prefix = crate::xml_helpers::name_prefix(&e);
                    }
                    match tables.iter().find(|(name, ..)| e.local_name().as_ref() == *name) {
                        Some((_, count, added)) if !added.is_empty() => {
                            writer.write_event(Event::Start(with_count(&e, *count)))?;
                        }
                        _ => writer.write_event(Event::Start(e))?,
                    }
                }
                Event::End(e) => {
                    if let Some((_, _, added)) = tables
                        .iter()
                        .find(|(name, ..)| e.local_name().as_ref() == *name)
                    {
                        let xml = qualify(added, prefix.as_deref());
                        writer.get_mut().extend_from_slice(xml.as_bytes());
                    }
                    writer.write_event(Event::End(e))?;
                }
                Event::Empty(e) => {
                    match tables.iter().find(|(name, ..)| e.local_name().as_ref() == *name) {
                        Some((_, count, added)) if !added.is_empty() => {
                            let start = with_count(&e, *count);
                            let end = start.to_end().into_owned();
                            writer.write_event(Event::Start(start))?;
                            let xml = qualify(added, prefix.as_deref());
                            writer.get_mut().extend_from_slice(xml.as_bytes());
                            writer.write_event(Event::End(end))?;
                        }
                        _ => writer.write_event(Event::Empty(e))?,
                    }
                }
                Event::Eof => break,
                event => writer.write_event(event)?,
            }
        }

        tracing::debug!(
            fonts = self.fonts.len(),
            fills = self.fills.len(),
            borders = self.borders.len(),
            xfs = self.xfs.len(),
            "appended style records"
        );
        Ok(writer.into_inner())
    }
}

fn find_or_append<T: PartialEq + Clone>(base: &[T], added: &mut Vec<T>, item: &T) -> u32 {
    if let Some(pos) = base.iter().position(|x| x == item) {
        return index_of(pos);
    }
    if let Some(pos) = added.iter().position(|x| x == item) {
        return index_of(base.len() + pos);
    }
    added.push(item.clone());
    index_of(base.len() + added.len() - 1)
}

/// Copy of a start tag with its `count` attribute set to `count`.
fn with_count(e: &BytesStart, count: usize) -> BytesStart<'static> {
    let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut out = BytesStart::new(name);
    let count = count.to_string();
    let mut has_count = false;
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == b"count" {
            out.push_attribute((b"count".as_slice(), count.as_bytes()));
            has_count = true;
        } else {
            out.push_attribute(attr);
        }
    }
    if !has_count {
        out.push_attribute(("count", count.as_str()));
    }
    out
}

/// Add the styleSheet namespace prefix to generated element names.
fn qualify(xml: &str, prefix: Option<&str>) -> String {
    let Some(prefix) = prefix else {
        return xml.to_string();
    };
    let mut out = String::with_capacity(xml.len() * 2);
    let mut chars = xml.chars().peekable();
    while let Some(c) = chars.next() {
        out.push(c);
        if c == '<' {
            if chars.peek() == Some(&'/') {
                out.push('/');
                chars.next();
            }
            out.push_str(prefix);
            out.push(':');
        }
    }
    out
}

fn bool_attr(out: &mut Vec<(String, String)>, key: &str, value: Option<bool>) {
    if let Some(v) = value {
        out.push((key.to_string(), if v { "1" } else { "0" }.to_string()));
    }
}

fn opt_attr<T: ToString>(out: &mut Vec<(String, String)>, key: &str, value: Option<T>) {
    if let Some(v) = value {
        out.push((key.to_string(), v.to_string()));
    }
}

fn color_xml(element: &str, color: &Color) -> String {
    let mut attrs = Vec::new();
    bool_attr(&mut attrs, "auto", color.auto);
    opt_attr(&mut attrs, "indexed", color.indexed);
    opt_attr(&mut attrs, "rgb", color.rgb.as_deref());
    opt_attr(&mut attrs, "theme", color.theme);
    opt_attr(&mut attrs, "tint", color.tint);
    let mut out = format!("<{element}");
    push_attrs(&mut out, &attrs);
    out.push_str("/>");
    out
}

fn val_element(out: &mut String, element: &str, value: &str) {
    out.push_str(&format!("<{element} val=\"{}\"/>", xml_escape(value)));
}

pub(crate) fn font_xml(font: &Font) -> String {
    let mut out = String::from("<font>");
    for (on, element) in [
        (font.bold, "b"),
        (font.italic, "i"),
        (font.strike, "strike"),
        (font.condense, "condense"),
        (font.extend, "extend"),
        (font.outline, "outline"),
        (font.shadow, "shadow"),
    ] {
        if on {
            out.push_str(&format!("<{element}/>"));
        }
    }
    match font.underline.as_deref() {
        Some("single") => out.push_str("<u/>"),
        Some(kind) => val_element(&mut out, "u", kind),
        None => {}
    }
    if let Some(v) = &font.vert_align {
        val_element(&mut out, "vertAlign", v);
    }
    if let Some(size) = font.size {
        val_element(&mut out, "sz", &size.to_string());
    }
    if let Some(color) = &font.color {
        out.push_str(&color_xml("color", color));
    }
    if let Some(name) = &font.name {
        val_element(&mut out, "name", name);
    }
    if let Some(family) = font.family {
        val_element(&mut out, "family", &family.to_string());
    }
    if let Some(charset) = font.charset {
        val_element(&mut out, "charset", &charset.to_string());
    }
    if let Some(scheme) = &font.scheme {
        val_element(&mut out, "scheme", scheme);
    }
    out.push_str("</font>");
    out
}

pub(crate) fn fill_xml(fill: &Fill) -> String {
    let mut out = String::from("<fill>");
    match fill {
        Fill::Pattern {
            pattern_type,
            fg_color,
            bg_color,
        } => {
            out.push_str("<patternFill");
            if let Some(p) = pattern_type {
                out.push_str(&format!(" patternType=\"{}\"", xml_escape(p)));
            }
            if fg_color.is_none() && bg_color.is_none() {
                out.push_str("/>");
            } else {
                out.push('>');
                if let Some(c) = fg_color {
                    out.push_str(&color_xml("fgColor", c));
                }
                if let Some(c) = bg_color {
                    out.push_str(&color_xml("bgColor", c));
                }
                out.push_str("</patternFill>");
            }
        }
        Fill::Gradient { attrs, stops } => {
            out.push_str("<gradientFill");
            push_attrs(&mut out, attrs);
            out.push('>');
            for stop in stops {
                out.push_str(&format!("<stop position=\"{}\">", stop.position));
                out.push_str(&color_xml("color", &stop.color));
                out.push_str("</stop>");
            }
            out.push_str("</gradientFill>");
        }
    }
    out.push_str("</fill>");
    out
}

fn side_xml(out: &mut String, element: &str, side: &BorderSide) {
    out.push_str(&format!("<{element}"));
    if let Some(style) = &side.style {
        out.push_str(&format!(" style=\"{}\"", xml_escape(style)));
    }
    match &side.color {
        Some(color) => {
            out.push('>');
            out.push_str(&color_xml("color", color));
            out.push_str(&format!("</{element}>"));
        }
        None => out.push_str("/>"),
    }
}

pub(crate) fn border_xml(border: &Border) -> String {
    let mut attrs = Vec::new();
    bool_attr(&mut attrs, "diagonalUp", border.diagonal_up);
    bool_attr(&mut attrs, "diagonalDown", border.diagonal_down);
    bool_attr(&mut attrs, "outline", border.outline);
    let mut out = String::from("<border");
    push_attrs(&mut out, &attrs);
    out.push('>');
    for (element, side) in [
        ("left", &border.left),
        ("right", &border.right),
        ("top", &border.top),
        ("bottom", &border.bottom),
        ("diagonal", &border.diagonal),
    ] {
        if let Some(side) = side {
            side_xml(&mut out, element, side);
        }
    }
    out.push_str("</border>");
    out
}

fn alignment_xml(alignment: &Alignment) -> String {
    let mut attrs = Vec::new();
    opt_attr(&mut attrs, "horizontal", alignment.horizontal.as_deref());
    opt_attr(&mut attrs, "vertical", alignment.vertical.as_deref());
    opt_attr(&mut attrs, "textRotation", alignment.text_rotation);
    bool_attr(&mut attrs, "wrapText", alignment.wrap_text);
    opt_attr(&mut attrs, "indent", alignment.indent);
    opt_attr(&mut attrs, "relativeIndent", alignment.relative_indent);
    bool_attr(&mut attrs, "justifyLastLine", alignment.justify_last_line);
    bool_attr(&mut attrs, "shrinkToFit", alignment.shrink_to_fit);
    opt_attr(&mut attrs, "readingOrder", alignment.reading_order);
    let mut out = String::from("<alignment");
    push_attrs(&mut out, &attrs);
    out.push_str("/>");
    out
}

fn protection_xml(protection: Protection) -> String {
    let mut attrs = Vec::new();
    bool_attr(&mut attrs, "locked", protection.locked);
    bool_attr(&mut attrs, "hidden", protection.hidden);
    let mut out = String::from("<protection");
    push_attrs(&mut out, &attrs);
    out.push_str("/>");
    out
}

pub(crate) fn xf_xml(xf: &CellXf) -> String {
    let mut attrs = Vec::new();
    opt_attr(&mut attrs, "numFmtId", xf.num_fmt_id);
    opt_attr(&mut attrs, "fontId", xf.font_id);
    opt_attr(&mut attrs, "fillId", xf.fill_id);
    opt_attr(&mut attrs, "borderId", xf.border_id);
    opt_attr(&mut attrs, "xfId", xf.xf_id);
    if xf.quote_prefix {
        attrs.push(("quotePrefix".to_string(), "1".to_string()));
    }
    for (present, key) in [
        (xf.num_fmt_id.is_some_and(|id| id != 0), "applyNumberFormat"),
        (xf.font_id.is_some(), "applyFont"),
        (xf.fill_id.is_some(), "applyFill"),
        (xf.border_id.is_some(), "applyBorder"),
        (xf.alignment.is_some(), "applyAlignment"),
        (xf.protection.is_some(), "applyProtection"),
    ] {
        if present {
            attrs.push((key.to_string(), "1".to_string()));
        }
    }

    let mut out = String::from("<xf");
    push_attrs(&mut out, &attrs);
    if xf.alignment.is_none() && xf.protection.is_none() {
        out.push_str("/>");
        return out;
    }
    out.push('>');
    if let Some(alignment) = &xf.alignment {
        out.push_str(&alignment_xml(alignment));
    }
    if let Some(protection) = xf.protection {
        out.push_str(&protection_xml(protection));
    }
    out.push_str("</xf>");
    out
}
