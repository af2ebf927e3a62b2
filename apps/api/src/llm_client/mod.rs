//! LLM client: the single point of entry for all Gemini API calls.
//!
//! No other module talks to the generative-language API directly; the
//! analysis pipeline depends on the `GenerativeModel` trait so tests can
//! substitute a fake.
//!
//! Model: gemini-2.0-flash
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";
/// The model used for all resume analysis.
pub const MODEL: &str = "gemini-2.0-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("GEMINI_API_KEY is not configured")]
    NotConfigured,

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },
}

/// Handle returned by the file-registration endpoint, referenced in a later
/// generation call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedFile {
    pub name: String,
    pub uri: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

/// The external generative model, as seen by the analysis pipeline.
///
/// Replies are returned verbatim. An empty reply is `Ok("")`; deciding
/// whether it is usable is the caller's job.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// Inline-text mode: a single prompt, everything embedded in it.
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;

    /// Registers file bytes with the service. No retry.
    async fn upload_file(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, LlmError>;

    /// File-attachment mode: prompt plus a previously uploaded file.
    async fn generate_with_file(
        &self,
        prompt: &str,
        file: &UploadedFile,
    ) -> Result<String, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    File {
        file_data: FileData<'a>,
    },
}

#[derive(Debug, Serialize)]
struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    #[serde(rename = "promptTokenCount", default)]
    pub prompt_tokens: u32,
    #[serde(rename = "candidatesTokenCount", default)]
    pub output_tokens: u32,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate; empty when the model sent none.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini client
// ────────────────────────────────────────────────────────────────────────────

/// Gemini REST client. Built once at startup and shared through `AppState`.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl LlmClient {
    pub fn new(api_key: Option<String>) -> Result<Self, LlmError> {
        Self::with_base_url(api_key, GEMINI_API_BASE)
    }

    pub fn with_base_url(api_key: Option<String>, base_url: &str) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, LlmError> {
        self.api_key.as_deref().ok_or(LlmError::NotConfigured)
    }

    async fn call(&self, parts: Vec<Part<'_>>) -> Result<String, LlmError> {
        let api_key = self.api_key()?;
        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, MODEL);
        let body = GenerateRequest {
            contents: vec![Content { role: "user", parts }],
        };

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let response: GenerateResponse = check_status(response).await?.json().await?;

        if let Some(usage) = &response.usage {
            debug!(
                "Gemini call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_tokens, usage.output_tokens
            );
        }

        Ok(response.text())
    }
}

#[async_trait]
impl GenerativeModel for LlmClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        self.call(vec![Part::Text { text: prompt }]).await
    }

    async fn upload_file(
        &self,
        data: Vec<u8>,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, LlmError> {
        let api_key = self.api_key()?;
        let url = format!("{}/upload/v1beta/files", self.base_url);
        let size = data.len();

        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", api_key)
            .header("X-Goog-Upload-Protocol", "raw")
            .header("X-Goog-Upload-File-Name", display_name)
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(data)
            .send()
            .await?;

        let uploaded: UploadResponse = check_status(response).await?.json().await?;
        debug!(
            "Uploaded {} ({} bytes, {}) as {}",
            display_name, size, mime_type, uploaded.file.name
        );
        Ok(uploaded.file)
    }

    async fn generate_with_file(
        &self,
        prompt: &str,
        file: &UploadedFile,
    ) -> Result<String, LlmError> {
        self.call(vec![
            Part::Text { text: prompt },
            Part::File {
                file_data: FileData {
                    mime_type: &file.mime_type,
                    file_uri: &file.uri,
                },
            },
        ])
        .await
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, LlmError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    // Try to parse error message
    let message = serde_json::from_str::<GeminiError>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body);
    Err(LlmError::Api {
        status: status.as_u16(),
        message,
    })
}
