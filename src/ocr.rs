//! OCR delegate.
//!
//! Scanned PDFs and raster images are handed to an [`OcrDelegate`]. The
//! analyzers only see [`OcrOutcome`]; a delegate never returns an error,
//! it reports unavailability or a failure string instead.
//!
//! ```text
//! image bytes → prepare_image (sniff / re-encode PNG) → Messages API → text
//! ```

use base64::Engine;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Cursor;
use std::time::{Duration, Instant};

use crate::config::{OcrConfig, DEFAULT_ENDPOINT, DEFAULT_MAX_TOKENS, DEFAULT_MODEL};
use crate::error::{DocCheckError, Result};

/// Prefix of every OCR failure string.
pub const FAILURE_PREFIX: &str = "OCR 오류";

/// Returned by a delegate that has no credential.
pub const NO_KEY_MESSAGE: &str = "API 키가 설정되지 않았습니다.";

const ANTHROPIC_VERSION: &str = "2023-06-01";

const PROMPT: &str = "이 이미지의 모든 텍스트를 정확하게 추출해주세요.

요구사항:
1. 원본의 단락 구분을 정확히 유지
2. 적절한 띄어쓰기 적용
3. 표가 있다면 마크다운 표 형식으로
4. 제목과 본문 구분 명확히
5. 불필요한 공백 제거";

/// Result of one OCR call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OcrOutcome {
    Text(String),
    /// No credential configured.
    Unavailable,
    /// The call failed; the string is user-facing and keeps the cause.
    Failed(String),
}

impl OcrOutcome {
    pub fn failed(cause: impl std::fmt::Display) -> Self {
        Self::Failed(format!("{FAILURE_PREFIX}: {cause}"))
    }

    /// Text to put in an extracted-text artifact.
    pub fn into_text(self) -> String {
        match self {
            Self::Text(text) | Self::Failed(text) => text,
            Self::Unavailable => NO_KEY_MESSAGE.to_string(),
        }
    }
}

/// Text extraction capability injected into the document analyzers.
pub trait OcrDelegate: Send + Sync {
    /// Whether a call could succeed at all (a credential is configured).
    fn is_available(&self) -> bool;

    /// Extract text from one encoded raster image.
    fn recognize(&self, image: &[u8]) -> OcrOutcome;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Delegate used when no key is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOcr;

impl OcrDelegate for NoOcr {
    fn is_available(&self) -> bool {
        false
    }

    fn recognize(&self, _image: &[u8]) -> OcrOutcome {
        OcrOutcome::Unavailable
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// OCR through the Anthropic Messages API.
pub struct ClaudeOcr {
    api_key: String,
    model: String,
    max_tokens: u32,
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl std::fmt::Debug for ClaudeOcr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClaudeOcr")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl ClaudeOcr {
    /// Create a delegate with default model and endpoint and no request timeout.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_key, None)
    }

    pub fn with_timeout(api_key: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()?;
        Ok(Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            client,
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Use a different endpoint (proxies, test servers).
    pub fn with_endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = url.into();
        self
    }

    /// Build from settings. `None` when no key is configured.
    pub fn from_config(config: &OcrConfig) -> Result<Option<Self>> {
        let Some(key) = config.api_key() else {
            return Ok(None);
        };
        let ocr = Self::with_timeout(key, config.timeout_secs.map(Duration::from_secs))?
            .with_model(config.model.as_str())
            .with_max_tokens(config.max_tokens)
            .with_endpoint(config.endpoint.as_str());
        Ok(Some(ocr))
    }

    fn build_request(&self, media_type: &str, image: &[u8]) -> MessagesRequest {
        MessagesRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages: vec![Message {
                role: "user".to_string(),
                content: vec![
                    ContentPart::Image {
                        source: ImageSource {
                            kind: "base64".to_string(),
                            media_type: media_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                    ContentPart::Text {
                        text: PROMPT.to_string(),
                    },
                ],
            }],
        }
    }

    fn call(&self, image: &[u8]) -> Result<String> {
        let (media_type, image) = prepare_image(image)?;
        let request = self.build_request(media_type, &image);

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(DocCheckError::Ocr(format!("{status}: {message}")));
        }

        let response: MessagesResponse = response.json()?;
        Ok(response
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("\n"))
    }
}

impl OcrDelegate for ClaudeOcr {
    fn is_available(&self) -> bool {
        !self.api_key.is_empty()
    }

    fn recognize(&self, image: &[u8]) -> OcrOutcome {
        if !self.is_available() {
            return OcrOutcome::Unavailable;
        }
        let start = Instant::now();
        match self.call(image) {
            Ok(text) => {
                tracing::info!(
                    model = %self.model,
                    chars = text.chars().count(),
                    elapsed_ms = start.elapsed().as_millis(),
                    "OCR completed"
                );
                OcrOutcome::Text(text)
            }
            Err(e) => {
                tracing::warn!(model = %self.model, error = %e, "OCR failed");
                OcrOutcome::failed(e)
            }
        }
    }

    fn name(&self) -> &str {
        "claude"
    }
}

/// The delegate the configuration asks for: [`ClaudeOcr`] with a key, [`NoOcr`] without.
pub fn delegate_from_config(config: &OcrConfig) -> Result<Box<dyn OcrDelegate>> {
    Ok(match ClaudeOcr::from_config(config)? {
        Some(ocr) => Box::new(ocr),
        None => Box::new(NoOcr),
    })
}

/// Media type from magic bytes, for the formats the service accepts as-is.
pub fn sniff_media_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.starts_with(b"RIFF") && bytes.get(8..12) == Some(&b"WEBP"[..]) {
        Some("image/webp")
    } else {
        None
    }
}

/// Pass accepted formats through; decode anything else and re-encode it as PNG.
pub fn prepare_image(bytes: &[u8]) -> Result<(&'static str, Cow<'_, [u8]>)> {
    if let Some(media_type) = sniff_media_type(bytes) {
        return Ok((media_type, Cow::Borrowed(bytes)));
    }
    let decoded = image::load_from_memory(bytes)?;
    let mut png = Vec::new();
    decoded.write_to(&mut Cursor::new(&mut png), image::ImageFormat::Png)?;
    tracing::debug!(
        width = decoded.width(),
        height = decoded.height(),
        bytes = png.len(),
        "re-encoded image as PNG"
    );
    Ok(("image/png", Cow::Owned(png)))
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<Message>,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: Vec<ContentPart>,
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ContentPart {
    Image { source: ImageSource },
    Text { text: String },
}

#[derive(Serialize)]
struct ImageSource {
    #[serde(rename = "type")]
    kind: String,
    media_type: String,
    data: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ResponseBlock>,
}

#[derive(Deserialize)]
struct ResponseBlock {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiError,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}
