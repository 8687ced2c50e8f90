//! Runtime configuration.
//!
//! Settings come from an optional TOML file. The OCR API key may also come
//! from `ANTHROPIC_API_KEY`, which is only consulted when the file leaves the
//! key unset. Empty keys count as absent.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;
use crate::types::Mode;

/// Environment variable holding the OCR service key.
pub const API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_MAX_TOKENS: u32 = 4096;
pub const DEFAULT_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub mode: Mode,
    pub ocr: OcrConfig,
}

/// OCR delegate settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: u32,
    pub endpoint: String,
    /// Request timeout. `None` waits for the service indefinitely.
    pub timeout_secs: Option<u64>,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: None,
        }
    }
}

/// Where the OCR key was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    File,
    Environment,
    None,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::File => "file",
            KeySource::Environment => "environment",
            KeySource::None => "none",
        }
    }
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Read a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), mode = %config.mode, "loaded config");
        Ok(config)
    }

    /// Fill a missing API key from the process environment.
    pub fn with_env(mut self) -> Self {
        let source = self.ocr.resolve_api_key(std::env::var(API_KEY_ENV).ok());
        tracing::debug!(source = source.as_str(), "resolved OCR API key");
        self
    }
}

impl OcrConfig {
    /// The configured key, if non-empty.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Keep a file key when present, otherwise adopt `env_key`.
    pub fn resolve_api_key(&mut self, env_key: Option<String>) -> KeySource {
        if self.api_key().is_some() {
            return KeySource::File;
        }
        match env_key.filter(|k| !k.trim().is_empty()) {
            Some(key) => {
                self.api_key = Some(key);
                KeySource::Environment
            }
            None => {
                self.api_key = None;
                KeySource::None
            }
        }
    }
}
