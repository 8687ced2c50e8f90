use serde::{Deserialize, Serialize};

use super::CellStyle;

/// Scalar held by a cell. Strings are the only values the audit and
/// normalization passes inspect; everything else is carried through.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "t", content = "v", rename_all = "camelCase")]
pub enum CellValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Error(String),
    /// ISO 8601 text of a `t="d"` cell.
    Date(String),
}

impl CellValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

/// Formula text plus the `<f>` attributes it was written with (`t`, `ref`, `si`, ...).
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Formula {
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub attrs: Vec<(String, String)>,
}

impl Formula {
    /// Child of a shared formula: carries no text of its own.
    pub fn is_shared_child(&self) -> bool {
        self.text.is_empty() && self.attr("t") == Some("shared")
    }

    /// `si` of a shared formula master, the member holding the text and `ref`.
    pub fn shared_master_index(&self) -> Option<&str> {
        if self.text.is_empty() || self.attr("t") != Some("shared") || self.attr("ref").is_none() {
            return None;
        }
        self.attr("si")
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// A single cell's value and owned style.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CellValue>,
    pub style: CellStyle,
    /// `cellXfs` index the cell was loaded with; reused on write while the
    /// style still matches that record.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style_idx: Option<u32>,
    /// Shared-string index the value was loaded from, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shared_index: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<Formula>,
    /// Remaining `<c>` attributes (`cm`, `vm`, `ph`) passed through on write.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra_attrs: Vec<(String, String)>,
}

impl Cell {
    pub fn new(value: impl Into<CellValue>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// String value, if the cell holds one.
    pub fn text(&self) -> Option<&str> {
        self.value.as_ref().and_then(CellValue::as_str)
    }
}
