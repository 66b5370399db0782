//! Grounded answer generation: retrieved records are handed to a chat model
//! together with the user's question.
//!
//! The backend follows the embedding provider, so one vendor key serves both
//! calls: OpenAI chat completions for `openai`, Gemini `generateContent`
//! otherwise.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use recall_core::config::{ProviderKind, Settings};
use recall_core::ScoredResult;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Prompt listing each retrieved record as `title: text`, best first.
pub fn build_prompt(question: &str, results: &[ScoredResult]) -> String {
    let mut prompt = String::from("Answer the question using only the information below.\n\nInformation:\n");
    if results.is_empty() {
        prompt.push_str("(no matching information)\n");
    }
    for r in results {
        if r.title.is_empty() {
            prompt.push_str(&format!("- {}\n", r.text));
        } else {
            prompt.push_str(&format!("- {}: {}\n", r.title, r.text));
        }
    }
    prompt.push_str(&format!("\nQuestion: {question}\n"));
    prompt
}

pub trait AnswerGenerator {
    fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationBackend {
    Gemini,
    OpenAi,
}

impl GenerationBackend {
    pub fn for_provider(provider: ProviderKind) -> Self {
        match provider {
            ProviderKind::OpenAi => GenerationBackend::OpenAi,
            ProviderKind::Gemini | ProviderKind::Fake => GenerationBackend::Gemini,
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            GenerationBackend::Gemini => "gemini-flash-latest",
            GenerationBackend::OpenAi => "gpt-4o",
        }
    }

    pub fn key_env_var(self) -> &'static str {
        match self {
            GenerationBackend::Gemini => "GEMINI_API_KEY",
            GenerationBackend::OpenAi => "OPENAI_API_KEY",
        }
    }
}

/// Key for `backend`, in order: `generation.api_key`; `api_key` when it belongs
/// to the same vendor as the backend; the backend's environment variable.
pub fn generation_key_with<F>(settings: &Settings, backend: GenerationBackend, lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    let non_blank = |k: Option<String>| k.filter(|k| !k.trim().is_empty());
    non_blank(settings.generation.api_key.clone())
        .or_else(|| {
            if GenerationBackend::for_provider(settings.embedding.provider) == backend {
                non_blank(settings.api_key.clone())
            } else {
                None
            }
        })
        .or_else(|| non_blank(lookup(backend.key_env_var())))
}

/// Generator for the configured provider, keyed from settings or the environment.
pub fn generator_from_settings(settings: &Settings) -> Result<Box<dyn AnswerGenerator>> {
    let backend = GenerationBackend::for_provider(settings.embedding.provider);
    let key = generation_key_with(settings, backend, |name| std::env::var(name).ok()).ok_or_else(|| {
        anyhow!("no API key for answer generation; set generation.api_key, api_key or {}", backend.key_env_var())
    })?;
    let model = settings.generation.model.clone().unwrap_or_else(|| backend.default_model().to_string());
    let timeout = Duration::from_secs(settings.embedding.timeout_secs);

    let generator: Box<dyn AnswerGenerator> = match backend {
        GenerationBackend::Gemini => {
            let mut g = GeminiGenerator::new(key, model, timeout)?;
            if let Some(url) = &settings.generation.base_url {
                g = g.with_base_url(url.as_str());
            }
            Box::new(g)
        }
        GenerationBackend::OpenAi => {
            let mut g = OpenAiChatGenerator::new(key, model, timeout)?;
            if let Some(url) = &settings.generation.base_url {
                g = g.with_base_url(url.as_str());
            }
            Box::new(g)
        }
    };
    debug!(?backend, "answer generator ready");
    Ok(generator)
}

pub struct GeminiGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key: api_key.into(), model: model.into(), base_url: GEMINI_BASE_URL.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl AnswerGenerator for GeminiGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!(backend = "gemini", model = %self.model, prompt_len = prompt.len(), "generating answer");
        let body = GenerateRequest { contents: vec![Content { parts: vec![Part { text: prompt.to_string() }] }] };
        let response = self
            .client
            .post(format!("{}/models/{}:generateContent", self.base_url, self.model))
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .context("generateContent request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!("generateContent returned {status}: {text}");
        }
        let parsed: GenerateResponse = response.json().context("failed to parse generateContent response")?;
        gemini_text(parsed)
    }
}

pub struct OpenAiChatGenerator {
    client: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiChatGenerator {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, api_key: api_key.into(), model: model.into(), base_url: OPENAI_BASE_URL.to_string() })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

impl AnswerGenerator for OpenAiChatGenerator {
    fn generate(&self, prompt: &str) -> Result<String> {
        debug!(backend = "openai", model = %self.model, prompt_len = prompt.len(), "generating answer");
        let body = ChatRequest { model: &self.model, messages: vec![ChatMessage { role: "user", content: prompt }] };
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .context("chat completions request failed")?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().unwrap_or_default();
            bail!("chat completions returned {status}: {text}");
        }
        let parsed: ChatResponse = response.json().context("failed to parse chat completions response")?;
        chat_text(parsed)
    }
}

fn gemini_text(response: GenerateResponse) -> Result<String> {
    let candidate = response.candidates.into_iter().next().ok_or_else(|| anyhow!("no candidates in response"))?;
    let text: String = candidate.content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        bail!("candidate contained no text");
    }
    Ok(text)
}

fn chat_text(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| anyhow!("no message content in response"))
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(title: &str, text: &str, score: f64) -> ScoredResult {
        ScoredResult { title: title.into(), text: text.into(), score }
    }

    fn env_with(vars: &[(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars.to_vec();
        move |name: &str| vars.iter().find(|(k, _)| *k == name).map(|(_, v)| v.to_string())
    }

    fn settings(provider: ProviderKind, api_key: Option<&str>) -> Settings {
        let mut s = Settings::default();
        s.embedding.provider = provider;
        s.api_key = api_key.map(str::to_string);
        s
    }

    #[test]
    fn prompt_lists_results_in_order() {
        let prompt = build_prompt(
            "When is the deadline?",
            &[hit("remote-work", "By 6pm the prior day.", 0.8), hit("", "Untitled note.", 0.1)],
        );
        let first = prompt.find("- remote-work: By 6pm the prior day.").unwrap();
        let second = prompt.find("- Untitled note.").unwrap();
        assert!(first < second);
        assert!(prompt.trim_end().ends_with("Question: When is the deadline?"));
    }

    #[test]
    fn prompt_without_results_says_so() {
        assert!(build_prompt("q", &[]).contains("(no matching information)"));
    }

    #[test]
    fn backend_follows_embedding_provider() {
        assert_eq!(GenerationBackend::for_provider(ProviderKind::OpenAi), GenerationBackend::OpenAi);
        assert_eq!(GenerationBackend::for_provider(ProviderKind::Gemini), GenerationBackend::Gemini);
        assert_eq!(GenerationBackend::for_provider(ProviderKind::Fake), GenerationBackend::Gemini);
    }

    #[test]
    fn openai_key_is_never_sent_to_gemini() {
        let s = settings(ProviderKind::OpenAi, Some("sk-openai"));
        let env = env_with(&[("GEMINI_API_KEY", "g-env")]);
        assert_eq!(generation_key_with(&s, GenerationBackend::OpenAi, &env).as_deref(), Some("sk-openai"));
        assert_eq!(generation_key_with(&s, GenerationBackend::Gemini, &env).as_deref(), Some("g-env"));
        assert_eq!(generation_key_with(&s, GenerationBackend::Gemini, env_with(&[])), None);
    }

    #[test]
    fn shared_key_serves_same_vendor() {
        let s = settings(ProviderKind::Gemini, Some("g-file"));
        let env = env_with(&[("GEMINI_API_KEY", "g-env")]);
        assert_eq!(generation_key_with(&s, GenerationBackend::Gemini, &env).as_deref(), Some("g-file"));
    }

    #[test]
    fn generation_key_overrides_shared_key() {
        let mut s = settings(ProviderKind::OpenAi, Some("sk-openai"));
        s.generation.api_key = Some("dedicated".into());
        assert_eq!(generation_key_with(&s, GenerationBackend::OpenAi, env_with(&[])).as_deref(), Some("dedicated"));
    }

    #[test]
    fn missing_key_fails_before_any_request() {
        let s = settings(ProviderKind::Gemini, None);
        if std::env::var("GEMINI_API_KEY").is_err() {
            assert!(generator_from_settings(&s).is_err());
        }
    }

    #[test]
    fn gemini_text_parts_are_joined() {
        let parsed: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"By 6pm "},{"text":"the day before."}]}}]}"#,
        )
        .unwrap();
        assert_eq!(gemini_text(parsed).unwrap(), "By 6pm the day before.");
    }

    #[test]
    fn empty_candidates_are_an_error() {
        let parsed: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert!(gemini_text(parsed).is_err());
    }

    #[test]
    fn chat_reply_content_is_returned() {
        let parsed: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"index":0,"message":{"role":"assistant","content":"Three days a week."}}]}"#,
        )
        .unwrap();
        assert_eq!(chat_text(parsed).unwrap(), "Three days a week.");
        let empty: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(chat_text(empty).is_err());
    }

    #[test]
    fn chat_request_shape() {
        let body = ChatRequest { model: "gpt-4o", messages: vec![ChatMessage { role: "user", content: "hi" }] };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "hi");
    }
}
