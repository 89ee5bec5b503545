//! AI generation — client for the planning edge functions.
//!
//! DESIGN
//! ======
//! Each generator is a `POST {base}/functions/v1/{name}` returning an
//! envelope `{ success, data?, error? }`. [`EdgeFunctions`] is the transport
//! seam; [`GenerationClient`] adds validation, retry and payload decoding on
//! top, and [`HttpFunctions`] is the reqwest transport.
//!
//! ERROR HANDLING
//! ==============
//! Input is validated before any request. Only transport failures ("failed
//! to send a request") are retried, a fixed number of times with a fixed
//! delay. Each call is bounded by one overall timeout. Model output that is
//! not the expected JSON shape is a `Parse` error like any other failure.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use canvas::consts::STORY_SIZE;
use canvas::doc::{BmcData, CanvasElement, ElementContent, Position, StoryContent};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::config::GenerationConfig;
use crate::error::{ErrorClass, UserFacing, ValidationError, max_chars, require};

pub const GENERATE_BMC: &str = "generate-bmc";
pub const GENERATE_USER_STORIES: &str = "generate-user-stories";
pub const FILL_PDF: &str = "fill-pdf";

const MAX_NAME_CHARS: usize = 200;
const MAX_DESCRIPTION_CHARS: usize = 4000;
const STORY_COLUMNS: usize = 3;
const STORY_GAP: f64 = 20.0;

const LENIENT_PADDING: GeneralPurposeConfig =
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent);
const BASE64_STANDARD: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, LENIENT_PADDING);
const BASE64_URL_SAFE: GeneralPurpose = GeneralPurpose::new(&alphabet::URL_SAFE, LENIENT_PADDING);

// =============================================================================
// ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    /// Rejected before any request was made.
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// Failed to construct the HTTP client.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
    /// Transport failure; the message is what retry decisions look at.
    #[error("{0}")]
    Request(String),
    #[error("request timed out after {secs}s")]
    Timeout { secs: u64 },
    /// Non-success HTTP status.
    #[error("function returned {status}: {body}")]
    Status { status: u16, body: String },
    /// The function answered `success: false`.
    #[error("generation failed: {0}")]
    Remote(String),
    /// The response or the model output had an unexpected shape.
    #[error("unexpected response: {0}")]
    Parse(String),
}

impl GenerationError {
    #[must_use]
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::Timeout { .. } => ErrorClass::Timeout,
            Self::Status { status: 429, .. } => ErrorClass::RateLimit,
            Self::Validation(_) | Self::Parse(_) | Self::HttpClientBuild(_) => ErrorClass::Unknown,
            _ => ErrorClass::classify(&self.to_string()),
        }
    }

    /// Transport failures worth another attempt.
    fn is_send_failure(&self) -> bool {
        matches!(self, Self::Request(msg) if msg.to_lowercase().contains("failed to send a request"))
    }
}

impl UserFacing for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(inner) => inner.error_code(),
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
            Self::Request(_) => "E_GENERATION_REQUEST",
            Self::Timeout { .. } => "E_GENERATION_TIMEOUT",
            Self::Status { .. } => "E_GENERATION_STATUS",
            Self::Remote(_) => "E_GENERATION_FAILED",
            Self::Parse(_) => "E_GENERATION_PARSE",
        }
    }

    fn user_message(&self) -> String {
        match self {
            Self::Validation(inner) => inner.to_string(),
            Self::Parse(_) => "The AI response could not be understood. Please try again.".to_owned(),
            _ => self.class().friendly_message().to_owned(),
        }
    }

    fn retryable(&self) -> bool {
        self.is_send_failure()
    }
}

// =============================================================================
// REQUESTS
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BmcRequest {
    pub company_name: String,
    #[serde(default)]
    pub industry: String,
    pub description: String,
}

impl BmcRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let company = require("company name", &self.company_name)?;
        max_chars("company name", company, MAX_NAME_CHARS)?;
        max_chars("industry", &self.industry, MAX_NAME_CHARS)?;
        let description = require("description", &self.description)?;
        max_chars("description", description, MAX_DESCRIPTION_CHARS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoriesRequest {
    pub project_name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persona: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<u32>,
}

impl StoriesRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let name = require("project name", &self.project_name)?;
        max_chars("project name", name, MAX_NAME_CHARS)?;
        let description = require("description", &self.description)?;
        max_chars("description", description, MAX_DESCRIPTION_CHARS)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillPdfRequest {
    /// Template identifier or URL understood by the function.
    pub template: String,
    pub fields: Map<String, Value>,
}

impl FillPdfRequest {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("template", &self.template)?;
        Ok(())
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

#[async_trait::async_trait]
pub trait EdgeFunctions: Send + Sync {
    /// Invoke `function` and return the envelope's `data`.
    async fn invoke(&self, function: &str, body: &Value) -> Result<Value, GenerationError>;
}

pub struct HttpFunctions {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpFunctions {
    pub fn new(config: &GenerationConfig) -> Result<Self, GenerationError> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_secs))
            .build()
            .map_err(|e| GenerationError::HttpClientBuild(e.to_string()))?;
        Ok(Self {
            http,
            base_url: config.functions_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            timeout: config.timeout(),
        })
    }

    async fn post(&self, function: &str, body: &Value) -> Result<Value, GenerationError> {
        let url = format!("{}/functions/v1/{function}", self.base_url);
        let mut builder = self.http.post(url).json(body);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| GenerationError::Request(format!("failed to send a request to {function}: {e}")))?;
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Request(format!("failed to read {function} response: {e}")))?;

        if !(200..300).contains(&status) {
            return Err(GenerationError::Status { status, body: text });
        }
        parse_envelope(&text)
    }
}

#[async_trait::async_trait]
impl EdgeFunctions for HttpFunctions {
    async fn invoke(&self, function: &str, body: &Value) -> Result<Value, GenerationError> {
        match tokio::time::timeout(self.timeout, self.post(function, body)).await {
            Ok(result) => result,
            Err(_) => Err(GenerationError::Timeout { secs: self.timeout.as_secs() }),
        }
    }
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Unwrap `{ success, data?, error? }` into `data`.
pub fn parse_envelope(text: &str) -> Result<Value, GenerationError> {
    let envelope: Envelope = serde_json::from_str(text).map_err(|e| GenerationError::Parse(e.to_string()))?;
    if !envelope.success {
        return Err(GenerationError::Remote(envelope.error.unwrap_or_else(|| "unknown error".to_owned())));
    }
    envelope.data.ok_or_else(|| GenerationError::Parse("response has no data".to_owned()))
}

/// Remove a surrounding markdown code fence (with optional language tag).
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = rest.split_once('\n').map_or(rest, |(_, body)| body);
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Decode `data`, which is either JSON already or model text containing JSON.
fn decode_payload<T: DeserializeOwned>(data: Value) -> Result<T, GenerationError> {
    match data {
        Value::String(text) => {
            serde_json::from_str(strip_code_fences(&text)).map_err(|e| GenerationError::Parse(e.to_string()))
        }
        other => serde_json::from_value(other).map_err(|e| GenerationError::Parse(e.to_string())),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum StoriesPayload {
    List(Vec<StoryContent>),
    Wrapped { stories: Vec<StoryContent> },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PdfPayload {
    Encoded(String),
    Wrapped { pdf: String },
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct GenerationClient {
    functions: Arc<dyn EdgeFunctions>,
    retries: u32,
    retry_delay: Duration,
}

impl GenerationClient {
    #[must_use]
    pub fn new(functions: Arc<dyn EdgeFunctions>, config: &GenerationConfig) -> Self {
        Self { functions, retries: config.retries, retry_delay: config.retry_delay() }
    }

    /// Client over HTTP using `config`.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, GenerationError> {
        Ok(Self::new(Arc::new(HttpFunctions::new(config)?), config))
    }

    pub async fn generate_bmc(&self, request: &BmcRequest) -> Result<BmcData, GenerationError> {
        request.validate()?;
        let data = self.call(GENERATE_BMC, &to_body(request)?).await?;
        let bmc: BmcData = decode_payload(data)?;
        info!(company = %request.company_name, filled = bmc.filled_blocks(), "generation: bmc ready");
        Ok(bmc)
    }

    pub async fn generate_user_stories(&self, request: &StoriesRequest) -> Result<Vec<StoryContent>, GenerationError> {
        request.validate()?;
        let data = self.call(GENERATE_USER_STORIES, &to_body(request)?).await?;
        let stories = match decode_payload(data)? {
            StoriesPayload::List(stories) | StoriesPayload::Wrapped { stories } => stories,
        };
        info!(project = %request.project_name, count = stories.len(), "generation: stories ready");
        Ok(stories)
    }

    /// Fill a PDF template; returns the PDF bytes.
    pub async fn fill_pdf(&self, request: &FillPdfRequest) -> Result<Vec<u8>, GenerationError> {
        request.validate()?;
        let data = self.call(FILL_PDF, &to_body(request)?).await?;
        let encoded = match serde_json::from_value(data).map_err(|e| GenerationError::Parse(e.to_string()))? {
            PdfPayload::Encoded(text) | PdfPayload::Wrapped { pdf: text } => text,
        };
        decode_pdf(&encoded)
    }

    async fn call(&self, function: &str, body: &Value) -> Result<Value, GenerationError> {
        let mut attempt = 0;
        loop {
            match self.functions.invoke(function, body).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_send_failure() && attempt < self.retries => {
                    attempt += 1;
                    warn!(error = %e, function, attempt, total = self.retries, "generation request failed; retrying");
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => {
                    warn!(error = %e, function, code = e.error_code(), "generation failed");
                    return Err(e);
                }
            }
        }
    }
}

/// Decode a base64 PDF, optionally prefixed as a data URL. Whitespace and
/// missing padding are tolerated; the URL-safe alphabet is accepted too.
fn decode_pdf(encoded: &str) -> Result<Vec<u8>, GenerationError> {
    let payload = encoded.split_once("base64,").map_or(encoded, |(_, rest)| rest);
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64_STANDARD
        .decode(&compact)
        .or_else(|_| BASE64_URL_SAFE.decode(&compact))
        .map_err(|e| GenerationError::Parse(format!("pdf payload is not base64: {e}")))
}

fn to_body<T: Serialize>(request: &T) -> Result<Value, GenerationError> {
    serde_json::to_value(request).map_err(|e| GenerationError::Parse(e.to_string()))
}

// =============================================================================
// CANVAS PLACEMENT
// =============================================================================

/// A BMC board element holding `data`.
#[must_use]
pub fn bmc_element(data: BmcData, position: Position) -> CanvasElement {
    CanvasElement::with_content(ElementContent::Bmc(data), position)
}

/// Story cards laid out left-to-right in rows of three from `origin`.
#[must_use]
pub fn story_elements(stories: Vec<StoryContent>, origin: Position) -> Vec<CanvasElement> {
    let (width, height) = STORY_SIZE;
    stories
        .into_iter()
        .enumerate()
        .map(|(i, story)| {
            #[allow(clippy::cast_precision_loss)]
            let (col, row) = ((i % STORY_COLUMNS) as f64, (i / STORY_COLUMNS) as f64);
            let position = origin.offset(col * (width + STORY_GAP), row * (height + STORY_GAP));
            CanvasElement::with_content(ElementContent::Story(story), position)
        })
        .collect()
}

#[cfg(test)]
#[path = "generation_test.rs"]
mod tests;
