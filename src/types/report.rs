use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Normalization variant. `Analysis` adds status-symbol recoding.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Standard,
    Analysis,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Standard => f.write_str("standard"),
            Self::Analysis => f.write_str("analysis"),
        }
    }
}

impl FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "analysis" => Ok(Self::Analysis),
            other => Err(format!("unknown mode '{other}' (expected standard or analysis)")),
        }
    }
}

/// Letter grade derived from the final score.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    A,
    B,
    C,
    D,
}

impl Grade {
    pub fn from_score(score: i32) -> Self {
        match score {
            s if s >= 80 => Self::A,
            s if s >= 60 => Self::B,
            s if s >= 40 => Self::C,
            _ => Self::D,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FindingKind {
    MergedCells,
    Newlines,
    HiddenData,
    Error,
    Tables,
    ManySlides,
    ScannedPdf,
    NoApiKey,
    OcrSuccess,
    OcrFailed,
    ImageOcr,
}

/// One issue or warning line of a report.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Finding {
    #[serde(rename = "type")]
    pub kind: FindingKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl Finding {
    pub fn new(kind: FindingKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            count: None,
        }
    }

    pub fn counted(kind: FindingKind, count: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            count: Some(count),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CellIssueKind {
    MergedCell,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    High,
}

/// Cell-level finding, one per merge region.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CellIssue {
    pub sheet: String,
    /// Range label such as "B2:D4".
    pub cell: String,
    #[serde(rename = "type")]
    pub kind: CellIssueKind,
    pub severity: Severity,
    pub message: String,
    pub recommendation: String,
}

/// Score, grade and findings for one analyzed document.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AuditResult {
    pub score: i32,
    pub grade: Grade,
    pub issues: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub cell_issues: Vec<CellIssue>,
    /// Lower-cased extension with its dot, e.g. ".xlsx".
    pub file_type: String,
    pub mode: Mode,
}

impl AuditResult {
    pub const MAX_SCORE: i32 = 100;

    pub fn new(file_type: &str, mode: Mode) -> Self {
        Self {
            score: Self::MAX_SCORE,
            grade: Grade::A,
            issues: Vec::new(),
            warnings: Vec::new(),
            cell_issues: Vec::new(),
            file_type: file_type.to_string(),
            mode,
        }
    }

    pub fn deduct(&mut self, points: u32) {
        let points = i32::try_from(points).unwrap_or(i32::MAX);
        self.score = self.score.saturating_sub(points);
    }

    pub fn issue(&mut self, finding: Finding) {
        self.issues.push(finding);
    }

    pub fn warn(&mut self, finding: Finding) {
        self.warnings.push(finding);
    }

    /// Clamp the score to `[0, 100]` and derive the grade.
    #[must_use]
    pub fn finish(mut self) -> Self {
        self.score = self.score.clamp(0, Self::MAX_SCORE);
        self.grade = Grade::from_score(self.score);
        self
    }

    pub fn has_issue(&self, kind: FindingKind) -> bool {
        self.issues.iter().any(|f| f.kind == kind)
    }

    pub fn has_warning(&self, kind: FindingKind) -> bool {
        self.warnings.iter().any(|f| f.kind == kind)
    }
}
