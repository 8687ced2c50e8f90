//! Test fixtures for generating valid documents in memory.
//!
//! Builders for XLSX workbooks (cells, styles, merges, hidden rows and
//! columns), plus minimal DOCX, PPTX and PDF packages for the presence checks.
//!
//! # Example
//!
//! ```rust,ignore
//! use fixtures::{SheetBuilder, StyleBuilder, XlsxBuilder};
//!
//! let xlsx = XlsxBuilder::new()
//!     .sheet(
//!         SheetBuilder::new("Sheet1")
//!             .cell("A1", "Header", Some(StyleBuilder::new().bold().build()))
//!             .merge("A1:C1")
//!             .hide_row(3),
//!     )
//!     .build();
//!
//! let workbook = doccheck::parse(&xlsx).unwrap();
//! ```
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::indexing_slicing,
    clippy::float_cmp,
    clippy::panic,
    clippy::cast_possible_truncation,
    clippy::cast_lossless
)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::ZipWriter;

// ============================================================================
// Style Builder
// ============================================================================

/// Builder for creating cell styles.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleBuilder {
    // Font properties
    pub font_name: Option<String>,
    pub font_size: Option<f64>,
    pub font_color: Option<String>,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,

    // Fill properties
    pub bg_color: Option<String>,
    pub pattern_type: Option<String>,

    // Border properties
    pub border_top: Option<BorderSide>,
    pub border_right: Option<BorderSide>,
    pub border_bottom: Option<BorderSide>,
    pub border_left: Option<BorderSide>,

    // Alignment properties
    pub align_horizontal: Option<String>,
    pub align_vertical: Option<String>,
    pub wrap_text: bool,

    // Number format
    pub number_format: Option<u32>,
}

/// A border side definition.
#[derive(Debug, Clone, PartialEq)]
pub struct BorderSide {
    pub style: String,
    pub color: Option<String>,
}

impl BorderSide {
    #[must_use]
    pub fn new(style: &str) -> Self {
        Self {
            style: style.to_string(),
            color: None,
        }
    }

    #[must_use]
    pub fn color(mut self, color: &str) -> Self {
        self.color = Some(normalize_color(color));
        self
    }
}

impl StyleBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn font_name(mut self, name: &str) -> Self {
        self.font_name = Some(name.to_string());
        self
    }

    #[must_use]
    pub fn font_size(mut self, size: f64) -> Self {
        self.font_size = Some(size);
        self
    }

    #[must_use]
    pub fn font_color(mut self, color: &str) -> Self {
        self.font_color = Some(normalize_color(color));
        self
    }

    #[must_use]
    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    #[must_use]
    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    #[must_use]
    pub fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    /// Solid background fill.
    #[must_use]
    pub fn bg_color(mut self, color: &str) -> Self {
        self.bg_color = Some(normalize_color(color));
        self
    }

    #[must_use]
    pub fn pattern(mut self, pattern_type: &str) -> Self {
        self.pattern_type = Some(pattern_type.to_string());
        self
    }

    #[must_use]
    pub fn border_all(mut self, style: &str, color: Option<&str>) -> Self {
        let side = BorderSide {
            style: style.to_string(),
            color: color.map(normalize_color),
        };
        self.border_top = Some(side.clone());
        self.border_right = Some(side.clone());
        self.border_bottom = Some(side.clone());
        self.border_left = Some(side);
        self
    }

    #[must_use]
    pub fn border_bottom(mut self, side: BorderSide) -> Self {
        self.border_bottom = Some(side);
        self
    }

    #[must_use]
    pub fn align_horizontal(mut self, align: &str) -> Self {
        self.align_horizontal = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn align_vertical(mut self, align: &str) -> Self {
        self.align_vertical = Some(align.to_string());
        self
    }

    #[must_use]
    pub fn wrap_text(mut self) -> Self {
        self.wrap_text = true;
        self
    }

    /// Built-in number format id (e.g. 3 for `#,##0`).
    #[must_use]
    pub fn number_format(mut self, id: u32) -> Self {
        self.number_format = Some(id);
        self
    }

    #[must_use]
    pub fn build(self) -> Self {
        self
    }
}

// ============================================================================
// Cell Value
// ============================================================================

/// Represents a cell value that can be added to a sheet.
#[derive(Debug, Clone)]
pub enum CellValue {
    /// A shared string.
    String(String),
    Number(f64),
    Boolean(bool),
    /// An inline string (not shared).
    InlineString(String),
    /// A formula with its cached numeric result.
    Formula(String, f64),
    /// Member `si` of a shared formula group. The master carries the text
    /// and the `ref` range; the other members carry neither.
    SharedFormula {
        si: u32,
        master: Option<(String, String)>,
        cached: f64,
    },
    /// An empty cell (style only).
    Empty,
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(f64::from(n))
    }
}

impl From<bool> for CellValue {
    fn from(b: bool) -> Self {
        CellValue::Boolean(b)
    }
}

// ============================================================================
// Sheet Builder
// ============================================================================

#[derive(Debug, Clone)]
pub struct CellEntry {
    pub cell_ref: String,
    pub value: CellValue,
    pub style: Option<StyleBuilder>,
}

#[derive(Debug, Clone)]
pub struct ColumnWidth {
    pub min: u32,
    pub max: u32,
    pub width: f64,
    pub hidden: bool,
}

#[derive(Debug, Clone)]
pub struct RowHeight {
    pub row: u32,
    pub height: f64,
    pub hidden: bool,
}

/// Builder for a single worksheet.
#[derive(Debug, Clone, Default)]
pub struct SheetBuilder {
    pub name: String,
    pub cells: Vec<CellEntry>,
    pub merges: Vec<String>,
    pub col_widths: Vec<ColumnWidth>,
    pub row_heights: Vec<RowHeight>,
    pub page_margins: bool,
}

impl SheetBuilder {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            page_margins: true,
            ..Self::default()
        }
    }

    /// Add a cell with a value and optional style.
    #[must_use]
    pub fn cell<V: Into<CellValue>>(
        mut self,
        cell_ref: &str,
        value: V,
        style: Option<StyleBuilder>,
    ) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: value.into(),
            style,
        });
        self
    }

    /// Add an empty cell with only a style.
    #[must_use]
    pub fn styled_cell(mut self, cell_ref: &str, style: StyleBuilder) -> Self {
        self.cells.push(CellEntry {
            cell_ref: cell_ref.to_string(),
            value: CellValue::Empty,
            style: Some(style),
        });
        self
    }

    /// Add a merge range (e.g., "A1:B2").
    #[must_use]
    pub fn merge(mut self, range: &str) -> Self {
        self.merges.push(range.to_string());
        self
    }

    #[must_use]
    pub fn col_width(mut self, min: u32, max: u32, width: f64) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width,
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_cols(mut self, min: u32, max: u32) -> Self {
        self.col_widths.push(ColumnWidth {
            min,
            max,
            width: 8.43,
            hidden: true,
        });
        self
    }

    #[must_use]
    pub fn row_height(mut self, row: u32, height: f64) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height,
            hidden: false,
        });
        self
    }

    #[must_use]
    pub fn hide_row(mut self, row: u32) -> Self {
        self.row_heights.push(RowHeight {
            row,
            height: 15.0,
            hidden: true,
        });
        self
    }
}

// ============================================================================
// XLSX Builder
// ============================================================================

/// Builder for creating complete XLSX files.
#[derive(Debug, Default)]
pub struct XlsxBuilder {
    sheets: Vec<SheetBuilder>,
}

impl XlsxBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn sheet(mut self, sheet: SheetBuilder) -> Self {
        self.sheets.push(sheet);
        self
    }

    /// Build the XLSX file as bytes.
    #[must_use]
    pub fn build(self) -> Vec<u8> {
        let mut styles_collector = StylesCollector::new();
        let mut shared_strings: Vec<String> = Vec::new();

        for sheet in &self.sheets {
            for cell in &sheet.cells {
                if let Some(ref style) = cell.style {
                    styles_collector.add_style(style);
                }
                if let CellValue::String(ref s) = cell.value {
                    if !shared_strings.contains(s) {
                        shared_strings.push(s.clone());
                    }
                }
            }
        }

        let mut parts: Vec<(String, String)> = vec![
            (
                "[Content_Types].xml".to_string(),
                generate_content_types(self.sheets.len()),
            ),
            (
                "_rels/.rels".to_string(),
                package_rels("officeDocument", "xl/workbook.xml"),
            ),
            (
                "xl/_rels/workbook.xml.rels".to_string(),
                generate_workbook_rels(self.sheets.len()),
            ),
            ("xl/workbook.xml".to_string(), generate_workbook(&self.sheets)),
            (
                "xl/styles.xml".to_string(),
                styles_collector.generate_styles_xml(),
            ),
        ];
        if !shared_strings.is_empty() {
            parts.push((
                "xl/sharedStrings.xml".to_string(),
                generate_shared_strings(&shared_strings),
            ));
        }
        for (i, sheet) in self.sheets.iter().enumerate() {
            parts.push((
                format!("xl/worksheets/sheet{}.xml", i + 1),
                generate_sheet_xml(sheet, &shared_strings, &styles_collector),
            ));
        }

        zip_parts(&parts)
    }
}

// ============================================================================
// Styles Collector
// ============================================================================

/// Collects and deduplicates styles for the XLSX file.
#[derive(Debug, Default)]
struct StylesCollector {
    fonts: Vec<String>,
    fills: Vec<String>,
    borders: Vec<String>,
    cell_xfs: Vec<String>,
    style_map: Vec<(StyleBuilder, u32)>,
}

impl StylesCollector {
    fn new() -> Self {
        let mut collector = Self::default();
        collector
            .fonts
            .push(r#"<font><sz val="11"/><name val="Calibri"/></font>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="none"/></fill>"#.to_string());
        collector
            .fills
            .push(r#"<fill><patternFill patternType="gray125"/></fill>"#.to_string());
        collector
            .borders
            .push("<border><left/><right/><top/><bottom/><diagonal/></border>".to_string());
        collector
            .cell_xfs
            .push(r#"<xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>"#.to_string());
        collector
    }

    fn add_style(&mut self, style: &StyleBuilder) -> u32 {
        if let Some(idx) = self.get_style_index(style) {
            return idx;
        }

        let font_id = intern(&mut self.fonts, font_xml(style));
        let fill_id = match fill_xml(style) {
            Some(xml) => intern(&mut self.fills, xml),
            None => 0,
        };
        let border_id = match border_xml(style) {
            Some(xml) => intern(&mut self.borders, xml),
            None => 0,
        };
        let num_fmt_id = style.number_format.unwrap_or(0);

        let mut attrs = format!(
            r#"numFmtId="{num_fmt_id}" fontId="{font_id}" fillId="{fill_id}" borderId="{border_id}" xfId="0""#
        );
        if num_fmt_id > 0 {
            attrs.push_str(r#" applyNumberFormat="1""#);
        }
        if font_id > 0 {
            attrs.push_str(r#" applyFont="1""#);
        }
        if fill_id > 0 {
            attrs.push_str(r#" applyFill="1""#);
        }
        if border_id > 0 {
            attrs.push_str(r#" applyBorder="1""#);
        }

        let xf = match alignment_xml(style) {
            Some(alignment) => format!(r#"<xf {attrs} applyAlignment="1">{alignment}</xf>"#),
            None => format!("<xf {attrs}/>"),
        };

        let idx = self.cell_xfs.len() as u32;
        self.cell_xfs.push(xf);
        self.style_map.push((style.clone(), idx));
        idx
    }

    fn get_style_index(&self, style: &StyleBuilder) -> Option<u32> {
        self.style_map
            .iter()
            .find(|(existing, _)| existing == style)
            .map(|(_, idx)| *idx)
    }

    fn generate_styles_xml(&self) -> String {
        let mut xml = String::new();
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(
            r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );
        push_list(&mut xml, "fonts", &self.fonts);
        push_list(&mut xml, "fills", &self.fills);
        push_list(&mut xml, "borders", &self.borders);
        xml.push_str(r#"<cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>"#);
        push_list(&mut xml, "cellXfs", &self.cell_xfs);
        xml.push_str(r#"<cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>"#);
        xml.push_str(r#"<dxfs count="0"/>"#);
        xml.push_str("</styleSheet>");
        xml
    }
}

fn intern(list: &mut Vec<String>, xml: String) -> u32 {
    if let Some(i) = list.iter().position(|x| *x == xml) {
        return i as u32;
    }
    list.push(xml);
    (list.len() - 1) as u32
}

fn push_list(xml: &mut String, tag: &str, items: &[String]) {
    xml.push_str(&format!(r#"<{tag} count="{}">"#, items.len()));
    for item in items {
        xml.push_str(item);
    }
    xml.push_str(&format!("</{tag}>"));
}

fn font_xml(style: &StyleBuilder) -> String {
    let mut xml = String::from("<font>");
    if style.bold {
        xml.push_str("<b/>");
    }
    if style.italic {
        xml.push_str("<i/>");
    }
    if style.underline {
        xml.push_str("<u/>");
    }
    xml.push_str(&format!(r#"<sz val="{}"/>"#, style.font_size.unwrap_or(11.0)));
    if let Some(ref color) = style.font_color {
        xml.push_str(&format!(r#"<color rgb="{color}"/>"#));
    }
    xml.push_str(&format!(
        r#"<name val="{}"/>"#,
        escape_xml(style.font_name.as_deref().unwrap_or("Calibri"))
    ));
    xml.push_str("</font>");
    xml
}

fn fill_xml(style: &StyleBuilder) -> Option<String> {
    if style.bg_color.is_none() && style.pattern_type.is_none() {
        return None;
    }
    let pattern = style.pattern_type.as_deref().unwrap_or("solid");
    Some(match style.bg_color {
        Some(ref color) => format!(
            r#"<fill><patternFill patternType="{pattern}"><fgColor rgb="{color}"/><bgColor indexed="64"/></patternFill></fill>"#
        ),
        None => format!(r#"<fill><patternFill patternType="{pattern}"/></fill>"#),
    })
}

fn border_xml(style: &StyleBuilder) -> Option<String> {
    let sides = [
        ("left", &style.border_left),
        ("right", &style.border_right),
        ("top", &style.border_top),
        ("bottom", &style.border_bottom),
    ];
    if sides.iter().all(|(_, side)| side.is_none()) {
        return None;
    }
    let mut xml = String::from("<border>");
    for (name, side) in sides {
        match side {
            Some(side) => {
                xml.push_str(&format!(r#"<{name} style="{}">"#, side.style));
                if let Some(ref c) = side.color {
                    xml.push_str(&format!(r#"<color rgb="{c}"/>"#));
                }
                xml.push_str(&format!("</{name}>"));
            }
            None => xml.push_str(&format!("<{name}/>")),
        }
    }
    xml.push_str("<diagonal/></border>");
    Some(xml)
}

fn alignment_xml(style: &StyleBuilder) -> Option<String> {
    if style.align_horizontal.is_none() && style.align_vertical.is_none() && !style.wrap_text {
        return None;
    }
    let mut attrs = String::new();
    if let Some(ref h) = style.align_horizontal {
        attrs.push_str(&format!(r#" horizontal="{h}""#));
    }
    if let Some(ref v) = style.align_vertical {
        attrs.push_str(&format!(r#" vertical="{v}""#));
    }
    if style.wrap_text {
        attrs.push_str(r#" wrapText="1""#);
    }
    Some(format!("<alignment{attrs}/>"))
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize color to ARGB format (without #).
fn normalize_color(color: &str) -> String {
    let color = color.trim_start_matches('#').to_uppercase();
    if color.len() == 8 {
        color
    } else {
        format!("FF{color}")
    }
}

/// Escape XML special characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Write `(path, body)` parts into a deflated ZIP archive.
pub fn zip_parts(parts: &[(String, String)]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    for (path, body) in parts {
        zip.start_file(path.as_str(), options).unwrap();
        zip.write_all(body.as_bytes()).unwrap();
    }
    zip.finish().expect("Failed to finish ZIP").into_inner()
}

/// Read every entry of a ZIP archive as `path -> bytes`.
pub fn unzip(data: &[u8]) -> HashMap<String, Vec<u8>> {
    use std::io::Read;
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).unwrap();
    let mut out = HashMap::new();
    for i in 0..archive.len() {
        let mut file = archive.by_index(i).unwrap();
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).unwrap();
        out.insert(file.name().to_string(), buf);
    }
    out
}

fn package_rels(kind: &str, target: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/{kind}" Target="{target}"/></Relationships>"#
    )
}

fn generate_content_types(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/>"#);
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Override PartName="/xl/worksheets/sheet{i}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
        ));
    }
    xml.push_str("</Types>");
    xml
}

fn generate_workbook_rels(sheet_count: usize) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
    );
    for i in 1..=sheet_count {
        xml.push_str(&format!(
            r#"<Relationship Id="rId{i}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{i}.xml"/>"#
        ));
    }
    let rid = sheet_count + 1;
    xml.push_str(&format!(
        r#"<Relationship Id="rId{rid}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#
    ));
    xml.push_str(&format!(
        r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/>"#,
        rid + 1
    ));
    xml.push_str("</Relationships>");
    xml
}

fn generate_workbook(sheets: &[SheetBuilder]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#);
    xml.push_str("<sheets>");
    for (i, sheet) in sheets.iter().enumerate() {
        xml.push_str(&format!(
            r#"<sheet name="{}" sheetId="{}" r:id="rId{}"/>"#,
            escape_xml(&sheet.name),
            i + 1,
            i + 1
        ));
    }
    xml.push_str("</sheets></workbook>");
    xml
}

fn generate_shared_strings(strings: &[String]) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(&format!(
        r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="{0}" uniqueCount="{0}">"#,
        strings.len()
    ));
    for s in strings {
        xml.push_str(&format!(
            r#"<si><t xml:space="preserve">{}</t></si>"#,
            escape_xml(s)
        ));
    }
    xml.push_str("</sst>");
    xml
}

/// Parse a cell reference like "A1" into (col, row), 1-indexed.
fn parse_cell_ref(cell_ref: &str) -> (u32, u32) {
    let mut col: u32 = 0;
    let mut row: u32 = 0;
    for c in cell_ref.chars() {
        if c.is_ascii_alphabetic() {
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        } else if let Some(d) = c.to_digit(10) {
            row = row * 10 + d;
        }
    }
    (col, row)
}

fn generate_sheet_xml(
    sheet: &SheetBuilder,
    shared_strings: &[String],
    styles: &StylesCollector,
) -> String {
    let mut xml = String::new();
    xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
    xml.push_str(
        r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
    );
    xml.push_str(r#"<sheetViews><sheetView tabSelected="1" workbookViewId="0"/></sheetViews>"#);
    xml.push_str(r#"<sheetFormatPr defaultRowHeight="15"/>"#);

    if !sheet.col_widths.is_empty() {
        xml.push_str("<cols>");
        for col in &sheet.col_widths {
            let hidden = if col.hidden { r#" hidden="1""# } else { "" };
            xml.push_str(&format!(
                r#"<col min="{}" max="{}" width="{}" customWidth="1"{hidden}/>"#,
                col.min, col.max, col.width
            ));
        }
        xml.push_str("</cols>");
    }

    let mut rows: BTreeMap<u32, Vec<&CellEntry>> = BTreeMap::new();
    for cell in &sheet.cells {
        let (_, row) = parse_cell_ref(&cell.cell_ref);
        rows.entry(row).or_default().push(cell);
    }
    let row_height_map: HashMap<u32, &RowHeight> =
        sheet.row_heights.iter().map(|rh| (rh.row, rh)).collect();
    let row_numbers: BTreeSet<u32> = rows
        .keys()
        .copied()
        .chain(row_height_map.keys().copied())
        .collect();

    xml.push_str("<sheetData>");
    for row_num in row_numbers {
        let mut row_attrs = format!(r#"r="{row_num}""#);
        if let Some(rh) = row_height_map.get(&row_num) {
            row_attrs.push_str(&format!(r#" ht="{}" customHeight="1""#, rh.height));
            if rh.hidden {
                row_attrs.push_str(r#" hidden="1""#);
            }
        }
        xml.push_str(&format!("<row {row_attrs}>"));

        let mut cells = rows.get(&row_num).cloned().unwrap_or_default();
        cells.sort_by_key(|c| parse_cell_ref(&c.cell_ref).0);
        for cell in cells {
            let mut cell_attrs = format!(r#"r="{}""#, cell.cell_ref);
            if let Some(idx) = cell.style.as_ref().and_then(|s| styles.get_style_index(s)) {
                if idx > 0 {
                    cell_attrs.push_str(&format!(r#" s="{idx}""#));
                }
            }

            match &cell.value {
                CellValue::String(s) => {
                    let idx = shared_strings.iter().position(|x| x == s).unwrap_or(0);
                    xml.push_str(&format!(r#"<c {cell_attrs} t="s"><v>{idx}</v></c>"#));
                }
                CellValue::Number(n) => {
                    xml.push_str(&format!(r#"<c {cell_attrs}><v>{n}</v></c>"#));
                }
                CellValue::Boolean(b) => {
                    let v = u8::from(*b);
                    xml.push_str(&format!(r#"<c {cell_attrs} t="b"><v>{v}</v></c>"#));
                }
                CellValue::InlineString(s) => {
                    xml.push_str(&format!(
                        r#"<c {cell_attrs} t="inlineStr"><is><t>{}</t></is></c>"#,
                        escape_xml(s)
                    ));
                }
                CellValue::Formula(f, cached) => {
                    xml.push_str(&format!(
                        r#"<c {cell_attrs}><f>{}</f><v>{cached}</v></c>"#,
                        escape_xml(f)
                    ));
                }
                CellValue::SharedFormula { si, master, cached } => {
                    let f = match master {
                        Some((text, range)) => format!(
                            r#"<f t="shared" ref="{range}" si="{si}">{}</f>"#,
                            escape_xml(text)
                        ),
                        None => format!(r#"<f t="shared" si="{si}"/>"#),
                    };
                    xml.push_str(&format!(r#"<c {cell_attrs}>{f}<v>{cached}</v></c>"#));
                }
                CellValue::Empty => {
                    xml.push_str(&format!("<c {cell_attrs}/>"));
                }
            }
        }
        xml.push_str("</row>");
    }
    xml.push_str("</sheetData>");

    if !sheet.merges.is_empty() {
        xml.push_str(&format!(r#"<mergeCells count="{}">"#, sheet.merges.len()));
        for merge in &sheet.merges {
            xml.push_str(&format!(r#"<mergeCell ref="{merge}"/>"#));
        }
        xml.push_str("</mergeCells>");
    }

    if sheet.page_margins {
        xml.push_str(r#"<pageMargins left="0.7" right="0.7" top="0.75" bottom="0.75" header="0.3" footer="0.3"/>"#);
    }
    xml.push_str("</worksheet>");
    xml
}

// ============================================================================
// Convenience Functions
// ============================================================================

/// Single sheet with one string cell.
#[must_use]
pub fn xlsx_with_text(text: &str) -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(SheetBuilder::new("Sheet1").cell("A1", text, None))
        .build()
}

/// Workbook from the audit round-trip scenario: sheet 1 has two merges and a
/// hidden column, sheet 2 is clean, sheet 3 has five cells with line breaks.
#[must_use]
pub fn three_sheet_workbook() -> Vec<u8> {
    let header = StyleBuilder::new()
        .bold()
        .bg_color("#FFFF00")
        .border_all("thin", Some("#000000"))
        .align_horizontal("center");

    let sheet1 = SheetBuilder::new("요약")
        .cell("A1", "분기 보고", Some(header.clone()))
        .styled_cell("B1", header.clone())
        .styled_cell("C1", header)
        .merge("A1:C1")
        .cell("A2", "부서", None)
        .cell("A3", "영업", None)
        .cell("A4", "생산", None)
        .cell("B3", 120, None)
        .cell("B4", 80, None)
        .cell("C3", 1.5, None)
        .merge("A5:A6")
        .cell("A5", "비고", None)
        .cell("D2", "내부용", None)
        .hide_cols(4, 4);

    let sheet2 = SheetBuilder::new("Clean")
        .cell("A1", "name", None)
        .cell("B1", "value", None)
        .cell("A2", "alpha", None)
        .cell("B2", 1, None);

    let mut sheet3 = SheetBuilder::new("메모");
    for i in 1..=5 {
        sheet3 = sheet3.cell(&format!("A{i}"), format!("줄{i}\n다음"), None);
    }
    sheet3 = sheet3.cell("B1", "한 줄", None);

    XlsxBuilder::new()
        .sheet(sheet1)
        .sheet(sheet2)
        .sheet(sheet3)
        .build()
}

/// Roster for symbol recoding: headers on row 4, status marks below.
#[must_use]
pub fn roster_workbook() -> Vec<u8> {
    XlsxBuilder::new()
        .sheet(
            SheetBuilder::new("명단")
                .cell("A1", "교육 수료 명단", None)
                .cell("A4", "이름", None)
                .cell("B4", "수령여부", None)
                .cell("C4", "참석 여부", None)
                .cell("A5", "O", None)
                .cell("B5", "○", None)
                .cell("C5", "X", None)
                .cell("A6", "홍길동", None)
                .cell("B6", "×", None)
                .cell("C6", "●", None)
                .cell("A7", "김철수", None)
                .cell("C7", "보류", None),
        )
        .build()
}

// ============================================================================
// Other Office Packages
// ============================================================================

/// DOCX whose body holds `tables` top-level tables (each with a nested one).
#[must_use]
pub fn docx_with_tables(tables: usize) -> Vec<u8> {
    let mut body = String::from("<w:p><w:r><w:t>문서</w:t></w:r></w:p>");
    for _ in 0..tables {
        body.push_str("<w:tbl><w:tblPr/><w:tr><w:tc><w:p/><w:tbl><w:tr><w:tc><w:p/></w:tc></w:tr></w:tbl></w:tc></w:tr></w:tbl><w:p/>");
    }
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}<w:sectPr/></w:body></w:document>"#
    );
    zip_parts(&[
        (
            "[Content_Types].xml".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels".to_string(),
            package_rels("officeDocument", "word/document.xml"),
        ),
        ("word/document.xml".to_string(), document),
    ])
}

/// PPTX whose presentation part lists `slides` slides.
#[must_use]
pub fn pptx_with_slides(slides: usize) -> Vec<u8> {
    let ids: String = (0..slides)
        .map(|i| format!(r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + i, i + 2))
        .collect();
    let presentation = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><p:presentation xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst><p:sldIdLst>{ids}</p:sldIdLst><p:sldSz cx="9144000" cy="6858000"/></p:presentation>"#
    );
    zip_parts(&[
        (
            "[Content_Types].xml".to_string(),
            r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/></Types>"#.to_string(),
        ),
        (
            "_rels/.rels".to_string(),
            package_rels("officeDocument", "ppt/presentation.xml"),
        ),
        ("ppt/presentation.xml".to_string(), presentation),
    ])
}

// ============================================================================
// PDF
// ============================================================================

/// A page of a generated PDF.
#[derive(Debug, Clone)]
pub enum PdfPage {
    /// Courier text drawn on the page.
    Text(String),
    /// A full-page 8-bit RGB image and no text, like a scanner produces.
    Scan { width: u32, height: u32 },
    /// A full-page image with caller-supplied samples, stored unfiltered
    /// unless `filter` names one.
    Image {
        width: u32,
        height: u32,
        color_space: lopdf::Object,
        bits: i64,
        filter: Option<&'static str>,
        samples: Vec<u8>,
    },
    Blank,
}

/// Content and resources drawing one image XObject over an A4 page.
fn full_page_image(
    image_id: lopdf::ObjectId,
) -> (Vec<lopdf::content::Operation>, lopdf::Dictionary) {
    use lopdf::content::Operation;
    use lopdf::dictionary;

    (
        vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    595.into(),
                    0.into(),
                    0.into(),
                    842.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im1".into()]),
            Operation::new("Q", vec![]),
        ],
        dictionary! { "XObject" => dictionary! { "Im1" => image_id } },
    )
}

/// Build a PDF with the given pages using lopdf.
#[must_use]
pub fn pdf_with_pages(pages: &[PdfPage]) -> Vec<u8> {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });

    let mut kids: Vec<Object> = Vec::new();
    for page in pages {
        let (operations, resources) = match page {
            PdfPage::Text(text) => (
                vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                    Operation::new("ET", vec![]),
                ],
                dictionary! { "Font" => dictionary! { "F1" => font_id } },
            ),
            PdfPage::Scan { width, height } => {
                let pixels = vec![200u8; (*width as usize) * (*height as usize) * 3];
                let image_id = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => i64::from(*width),
                        "Height" => i64::from(*height),
                        "ColorSpace" => "DeviceRGB",
                        "BitsPerComponent" => 8,
                    },
                    pixels,
                ));
                full_page_image(image_id)
            }
            PdfPage::Image {
                width,
                height,
                color_space,
                bits,
                filter,
                samples,
            } => {
                let mut dict = dictionary! {
                    "Type" => "XObject",
                    "Subtype" => "Image",
                    "Width" => i64::from(*width),
                    "Height" => i64::from(*height),
                    "ColorSpace" => color_space.clone(),
                    "BitsPerComponent" => *bits,
                };
                if let Some(filter) = filter {
                    dict.set("Filter", *filter);
                }
                let image_id = doc.add_object(Stream::new(dict, samples.clone()));
                full_page_image(image_id)
            }
            PdfPage::Blank => (Vec::new(), dictionary! {}),
        };

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A small PNG.
#[must_use]
pub fn png_bytes() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(4, 4, image::Rgb([0, 0, 0]));
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .unwrap();
    out
}
