//! Structured error types for doccheck.
//!
//! Every fallible operation in the crate returns [`Result`]. The analysis
//! boundary turns these into `ERROR` findings instead of propagating them.

/// All errors that can occur while loading, checking or rewriting a document.
#[derive(Debug, thiserror::Error)]
pub enum DocCheckError {
    /// XML parsing error from quick-xml.
    #[error("XML parsing: {0}")]
    Xml(#[from] quick_xml::Error),

    /// ZIP archive error.
    #[error("ZIP archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// PDF structure error from lopdf.
    #[error("PDF: {0}")]
    Pdf(#[from] lopdf::Error),

    /// Raster image decode/encode error.
    #[error("Image: {0}")]
    Image(#[from] image::ImageError),

    /// HTTP transport error talking to the OCR service.
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    /// Invalid configuration file.
    #[error("Config: {0}")]
    Config(String),

    /// Invalid cell reference.
    #[error("Invalid cell reference: {0}")]
    CellRef(String),

    /// General parse error.
    #[error("Parse error: {0}")]
    Parse(String),

    /// OCR service returned an error payload.
    #[error("OCR: {0}")]
    Ocr(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Catch-all for string errors.
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DocCheckError>;

impl From<toml::de::Error> for DocCheckError {
    fn from(e: toml::de::Error) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<String> for DocCheckError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for DocCheckError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}
