//! OpenAI embedding provider over `/v1/embeddings`.
//!
//! The API has no task hints, so both modes embed the same way; a document
//! title is folded into the input as a leading line instead.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use recall_core::{EmbeddingProvider, Error, Result, TaskMode, Vector};

use crate::gemini::{build_client, error_detail};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "text-embedding-3-small";

const PROVIDER: &str = "OpenAI";

pub struct OpenAiProvider {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
    /// Matryoshka truncation requested from the API.
    dimensions: Option<usize>,
    id: String,
}

impl OpenAiProvider {
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::embedding(PROVIDER, "API key must not be empty"));
        }
        Ok(Self {
            client: build_client(Duration::from_secs(30))?,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            dimensions: None,
            id: format!("openai:{}", DEFAULT_MODEL),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.id = format!("openai:{}", self.model);
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = Some(dims);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }
}

fn input_text(text: &str, title: Option<&str>, mode: TaskMode) -> String {
    match (mode, title.filter(|t| !t.trim().is_empty())) {
        (TaskMode::Document, Some(title)) => format!("{title}\n{text}"),
        _ => text.to_string(),
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl EmbeddingProvider for OpenAiProvider {
    fn embedder_id(&self) -> &str {
        &self.id
    }

    fn embed(&self, text: &str, title: Option<&str>, mode: TaskMode) -> Result<Vector> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding text");

        let body = EmbeddingRequest {
            model: &self.model,
            input: vec![input_text(text, title, mode)],
            dimensions: self.dimensions,
        };
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
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

        let parsed: EmbeddingResponse = response.json().map_err(|e| {
            error!(provider = PROVIDER, error = %e, "failed to parse response");
            Error::embedding(PROVIDER, format!("failed to parse response: {e}"))
        })?;

        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::embedding(PROVIDER, "API returned empty response"))
    }
}
