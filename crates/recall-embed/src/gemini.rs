//! Gemini embedding provider over the `embedContent` REST endpoint.
//!
//! Task modes map to `RETRIEVAL_DOCUMENT` / `RETRIEVAL_QUERY`; the title hint
//! is sent only for documents, which is the only task type the API accepts it
//! for.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use recall_core::{EmbeddingProvider, Error, Result, TaskMode, Vector};

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "text-embedding-004";

const PROVIDER: &str = "Gemini";

pub struct GeminiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    output_dimensionality: Option<usize>,
    id: String,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::embedding(PROVIDER, "API key must not be empty"));
        }
        let client = build_client(Duration::from_secs(30))?;
        Ok(Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: GEMINI_BASE_URL.to_string(),
            output_dimensionality: None,
            id: format!("gemini:{}", DEFAULT_MODEL),
        })
    }

    /// Accepts both `text-embedding-004` and `models/text-embedding-004`.
    pub fn with_model(mut self, model: impl AsRef<str>) -> Self {
        let model = model.as_ref();
        self.model = model.strip_prefix("models/").unwrap_or(model).to_string();
        self.id = format!("gemini:{}", self.model);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_output_dimensionality(mut self, dims: usize) -> Self {
        self.output_dimensionality = Some(dims);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:embedContent", self.base_url, self.model)
    }

    fn request_body<'a>(&'a self, text: &'a str, title: Option<&'a str>, mode: TaskMode) -> EmbedContentRequest<'a> {
        let title = match mode {
            TaskMode::Document => title.filter(|t| !t.trim().is_empty()),
            TaskMode::Query => None,
        };
        EmbedContentRequest {
            model: format!("models/{}", self.model),
            content: Content { parts: vec![Part { text }] },
            task_type: mode.as_gemini_str(),
            title,
            output_dimensionality: self.output_dimensionality,
        }
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::blocking::Client> {
    reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::embedding("http", format!("failed to build HTTP client: {e}")))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_dimensionality: Option<usize>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorDetail,
}

#[derive(Deserialize)]
pub(crate) struct ErrorDetail {
    pub(crate) message: String,
}

/// Pull the API's own error message out of a failure body when there is one.
pub(crate) fn error_detail(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}

impl EmbeddingProvider for GeminiProvider {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn embed(&self, text: &str, title: Option<&str>, mode: TaskMode) -> Result<Vector> {
        debug!(provider = PROVIDER, model = %self.model, task = mode.as_gemini_str(), text_len = text.len(), "embedding text");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(text, title, mode))
            .send()
            .map_err(|e| {
                error!(provider = PROVIDER, error = %e, "request failed");
                Error::embedding(PROVIDER, format!("request failed: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            error!(provider = PROVIDER, %status, "API error");
            return Err(Error::embedding(PROVIDER, format!("API returned {status}: {}", error_detail(body))));
        }

        let parsed: EmbedContentResponse = response.json().map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Error::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        if parsed.embedding.values.is_empty() {
            return Err(Error::embedding(PROVIDER, "API returned an empty embedding"));
        }
        Ok(parsed.embedding.values)
    }
}
