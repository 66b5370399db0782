//! Embedding providers behind [`recall_core::EmbeddingProvider`].
//!
//! `APP_USE_FAKE_EMBEDDINGS=1` swaps any configured provider for the
//! deterministic [`FakeEmbedder`] so development and tests run offline.
#![deny(warnings)]
#![deny(dead_code)]
#![deny(unused_variables)]
#![deny(unused_imports)]

pub mod fake;
pub mod gemini;
pub mod openai;

use std::time::Duration;

use tracing::info;

use recall_core::config::{EmbeddingSettings, ProviderKind, Settings};
use recall_core::{EmbeddingProvider, Error, Result};

pub use fake::FakeEmbedder;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;

pub fn use_fake_embeddings() -> bool {
    std::env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Build the provider named by `settings.embedding`.
///
/// The API key is [`Settings::embedding_api_key`]: `settings.api_key`, falling
/// back to the provider's usual environment variable (`GEMINI_API_KEY` /
/// `OPENAI_API_KEY`). Production config validation uses the same lookup.
pub fn provider_from_settings(settings: &Settings) -> Result<Box<dyn EmbeddingProvider>> {
    let embedding = &settings.embedding;
    let kind = if use_fake_embeddings() { ProviderKind::Fake } else { embedding.provider };
    let timeout = Duration::from_secs(embedding.timeout_secs);

    let provider: Box<dyn EmbeddingProvider> = match kind {
        ProviderKind::Fake => Box::new(fake_from_settings(embedding)),
        ProviderKind::Gemini => {
            let key = api_key(settings, kind)?;
            let mut p = GeminiProvider::new(key)?.with_timeout(timeout)?;
            if let Some(model) = &embedding.model { p = p.with_model(model); }
            if let Some(url) = &embedding.base_url { p = p.with_base_url(url.as_str()); }
            if let Some(dims) = embedding.output_dimensionality { p = p.with_output_dimensionality(dims); }
            Box::new(p)
        }
        ProviderKind::OpenAi => {
            let key = api_key(settings, kind)?;
            let mut p = OpenAiProvider::new(key)?.with_timeout(timeout)?;
            if let Some(model) = &embedding.model { p = p.with_model(model.as_str()); }
            if let Some(url) = &embedding.base_url { p = p.with_base_url(url.as_str()); }
            if let Some(dims) = embedding.output_dimensionality { p = p.with_dimensions(dims); }
            Box::new(p)
        }
    };
    info!(embedder = provider.embedder_id(), "embedding provider ready");
    Ok(provider)
}

/// Provider for the default configuration (Gemini, or fake when forced).
pub fn get_default_embedder() -> Result<Box<dyn EmbeddingProvider>> {
    provider_from_settings(&Settings::default())
}

/// Fake provider sized from `embedding` settings, regardless of the configured kind.
pub fn fake_from_settings(embedding: &EmbeddingSettings) -> FakeEmbedder {
    FakeEmbedder::new(embedding.output_dimensionality.unwrap_or(embedding.fake_dim))
}

fn api_key(settings: &Settings, kind: ProviderKind) -> Result<String> {
    settings.embedding_api_key().ok_or_else(|| {
        let env_var = kind.key_env_var().unwrap_or("the provider's key variable");
        Error::InvalidConfig(format!("no API key: set api_key in .secrets.toml, APP_API_KEY or {env_var}"))
    })
}
