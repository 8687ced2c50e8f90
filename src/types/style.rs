use serde::{Deserialize, Serialize};

/// Color reference as written in styles.xml (`rgb`, `theme`+`tint`, `indexed` or `auto`).
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Color {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rgb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tint: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexed: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto: Option<bool>,
}

impl Color {
    pub fn rgb(argb: &str) -> Self {
        Self {
            rgb: Some(argb.to_string()),
            ..Self::default()
        }
    }
}

/// Font record (`<font>`). Flags are `Some(true)` when the element is present.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Font {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub outline: bool,
    pub shadow: bool,
    pub condense: bool,
    pub extend: bool,
    /// Underline `val`; `Some("single")` for a bare `<u/>`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub underline: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vert_align: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<u32>,
    /// "minor" (body) or "major" (headings)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GradientStop {
    pub position: f64,
    pub color: Color,
}

/// Fill record (`<fill>`): either a pattern fill or a gradient fill.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum Fill {
    Pattern {
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern_type: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        fg_color: Option<Color>,
        #[serde(skip_serializing_if = "Option::is_none")]
        bg_color: Option<Color>,
    },
    Gradient {
        /// `<gradientFill>` attributes (type, degree, left, right, top, bottom) as written.
        attrs: Vec<(String, String)>,
        stops: Vec<GradientStop>,
    },
}

impl Fill {
    pub fn solid(argb: &str) -> Self {
        Self::Pattern {
            pattern_type: Some("solid".to_string()),
            fg_color: Some(Color::rgb(argb)),
            bg_color: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BorderSide {
    /// Line style (`thin`, `medium`, `dashed`, ...); `None` for an empty side element.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
}

/// Border record (`<border>`). Sides keep their element order on write.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Border {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bottom: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagonal: Option<BorderSide>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagonal_up: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagonal_down: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outline: Option<bool>,
}

impl Border {
    /// Same line style and color on all four sides.
    pub fn all(style: &str, color: Color) -> Self {
        let side = BorderSide {
            style: Some(style.to_string()),
            color: Some(color),
        };
        Self {
            left: Some(side.clone()),
            right: Some(side.clone()),
            top: Some(side.clone()),
            bottom: Some(side),
            ..Self::default()
        }
    }
}

/// `<alignment>` attributes of an xf.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vertical: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrap_text: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shrink_to_fit: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indent: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_rotation: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_order: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub justify_last_line: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relative_indent: Option<i32>,
}

/// `<protection>` attributes of an xf.
#[derive(Debug, Serialize, Deserialize, Default, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Protection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hidden: Option<bool>,
}

/// Style bundle owned by one cell.
///
/// Every component is held by value: cloning a `CellStyle` is a deep copy, so
/// no two cells ever share mutable style state.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CellStyle {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font: Option<Font>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fill: Option<Fill>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alignment: Option<Alignment>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_fmt_id: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protection: Option<Protection>,
    /// Parent named style (`cellStyleXfs` index).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xf_id: Option<u32>,
    pub quote_prefix: bool,
}

/// One `<xf>` record from `cellXfs`, with component ids as written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellXf {
    pub font_id: Option<u32>,
    pub fill_id: Option<u32>,
    pub border_id: Option<u32>,
    pub num_fmt_id: Option<u32>,
    pub xf_id: Option<u32>,
    pub alignment: Option<Alignment>,
    pub protection: Option<Protection>,
    pub quote_prefix: bool,
}

/// Style records of styles.xml, indexed the way cells reference them.
#[derive(Debug, Default, Clone)]
pub struct StyleSheet {
    /// Zip part the records were read from (`xl/styles.xml` unless relocated).
    pub path: Option<String>,
    pub fonts: Vec<Font>,
    pub fills: Vec<Fill>,
    pub borders: Vec<Border>,
    pub cell_xfs: Vec<CellXf>,
}

impl StyleSheet {
    /// Resolve a `cellXfs` index into an owned style bundle.
    ///
    /// Components the xf does not reference (or that point past the end of
    /// their table) stay `None`.
    pub fn resolve(&self, idx: u32) -> Option<CellStyle> {
        let xf = self.cell_xfs.get(idx as usize)?;
        Some(CellStyle {
            font: xf
                .font_id
                .and_then(|id| self.fonts.get(id as usize))
                .cloned(),
            fill: xf
                .fill_id
                .and_then(|id| self.fills.get(id as usize))
                .cloned(),
            border: xf
                .border_id
                .and_then(|id| self.borders.get(id as usize))
                .cloned(),
            alignment: xf.alignment.clone(),
            num_fmt_id: xf.num_fmt_id,
            protection: xf.protection,
            xf_id: xf.xf_id,
            quote_prefix: xf.quote_prefix,
        })
    }

    /// Style applied to cells without an `s` attribute (`cellXfs[0]`).
    pub fn default_style(&self) -> CellStyle {
        self.resolve(0).unwrap_or_default()
    }
}
