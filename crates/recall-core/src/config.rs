//! Layered configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `.secrets.toml`
//! + `APP_*` env vars (nested keys split on `__`, e.g.
//! `APP_EMBEDDING__MODEL`). Provides helpers to expand `~` and `${VAR}` and to
//! resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

pub struct Config {
    figment: Figment,
    env_name: String,
    dir: PathBuf,
}

impl Config {
    /// Load from `RECALL_CONFIG_DIR` (default: current directory), environment
    /// chosen by `RUST_ENV` (default `dev`).
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        let dir = env::var("RECALL_CONFIG_DIR").map(expand_path).unwrap_or_else(|_| PathBuf::from("."));
        Self::load_in(&dir, &env_name)
    }

    /// Load with config files looked up under `dir`.
    pub fn load_in(dir: &Path, env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment
            .merge(Toml::file(dir.join(".secrets.toml")))
            .merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name: env_name.to_string(), dir: dir.to_path_buf() };
        validate_for_env(&config.env_name, &config.settings()?, |name| env::var(name).ok())?;
        Ok(config)
    }

    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    /// Directory the config files were read from.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Resolve a configured path (e.g. `data.corpus`) relative to the config directory.
    pub fn resolve_path<S: AsRef<str>>(&self, p: S) -> PathBuf {
        resolve_with_base(&self.dir, p)
    }

    /// Typed view of the whole configuration; missing keys take defaults.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to parse configuration: {}", e))
    }
}

fn validate_for_env<F>(env_name: &str, settings: &Settings, lookup: F) -> anyhow::Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    settings.validate()?;
    match env_name {
        "prod" | "production" => {
            let provider = settings.embedding.provider;
            if provider != ProviderKind::Fake && settings.embedding_api_key_with(lookup).is_none() {
                anyhow::bail!(
                    "an API key is required in production (use .secrets.toml, APP_API_KEY or {})",
                    provider.key_env_var().unwrap_or("the provider's key variable")
                );
            }
        }
        "dev" | "development" => {}
        "test" | "testing" => {}
        _ => {}
    }
    Ok(())
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// API key for the hosted embedding service. `API_KEY` is accepted too.
    #[serde(alias = "API_KEY")]
    pub api_key: Option<String>,
    pub embedding: EmbeddingSettings,
    pub search: SearchSettings,
    pub data: DataSettings,
    pub ingest: IngestSettings,
    pub generation: GenerationSettings,
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::Error;
        if self.embedding.output_dimensionality == Some(0) {
            return Err(Error::InvalidConfig("embedding.output_dimensionality must be > 0".into()));
        }
        if self.embedding.timeout_secs == 0 {
            return Err(Error::InvalidConfig("embedding.timeout_secs must be > 0".into()));
        }
        if self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be > 0".into()));
        }
        if self.data.corpus.trim().is_empty() {
            return Err(Error::InvalidConfig("data.corpus must not be empty".into()));
        }
        Ok(())
    }

    /// Key for the configured embedding provider: `api_key`, else the
    /// provider's own environment variable.
    pub fn embedding_api_key(&self) -> Option<String> {
        self.embedding_api_key_with(|name| env::var(name).ok())
    }

    pub fn embedding_api_key_with<F>(&self, lookup: F) -> Option<String>
    where
        F: Fn(&str) -> Option<String>,
    {
        non_blank(self.api_key.clone())
            .or_else(|| self.embedding.provider.key_env_var().and_then(|name| non_blank(lookup(name))))
    }
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.filter(|k| !k.trim().is_empty())
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Gemini,
    OpenAi,
    Fake,
}

impl ProviderKind {
    /// Environment variable the provider's SDKs read the key from.
    pub fn key_env_var(self) -> Option<&'static str> {
        match self {
            ProviderKind::Gemini => Some("GEMINI_API_KEY"),
            ProviderKind::OpenAi => Some("OPENAI_API_KEY"),
            ProviderKind::Fake => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: ProviderKind,
    /// Model name; each provider has its own default.
    pub model: Option<String>,
    pub output_dimensionality: Option<usize>,
    /// Override of the API base URL (proxies, tests).
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    /// Dimensionality of the offline fake embedder.
    pub fake_dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: ProviderKind::Gemini,
            model: None,
            output_dimensionality: None,
            base_url: None,
            timeout_secs: 30,
            fake_dim: 256,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// `None` prints the full ranking.
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub corpus: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { corpus: "data/handbook.toml".to_string() }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OnError {
    #[default]
    Abort,
    Skip,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub on_error: OnError,
}

/// Answer generation for `recall ask`. The backend follows
/// `embedding.provider`: OpenAI chat for `openai`, Gemini otherwise.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Model name; each backend has its own default.
    pub model: Option<String>,
    pub base_url: Option<String>,
    /// Key for the generation backend when it differs from `api_key`.
    pub api_key: Option<String>,
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        let s = Settings::default();
        assert!(s.validate().is_ok());
        assert_eq!(s.embedding.provider, ProviderKind::Gemini);
        assert_eq!(s.ingest.on_error, OnError::Abort);
        assert_eq!(s.search.top_k, None);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut s = Settings::default();
        s.embedding.timeout_secs = 0;
        assert!(s.validate().is_err());
    }

    fn env_with(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: Vec<(String, String)> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name: &str| vars.iter().find(|(k, _)| k == name).map(|(_, v)| v.clone())
    }

    #[test]
    fn embedding_key_prefers_settings_then_provider_env() {
        let mut s = Settings::default();
        assert_eq!(s.embedding_api_key_with(env_with(&[("GEMINI_API_KEY", "g-env")])).as_deref(), Some("g-env"));
        assert_eq!(s.embedding_api_key_with(env_with(&[("OPENAI_API_KEY", "sk-env")])), None);

        s.embedding.provider = ProviderKind::OpenAi;
        assert_eq!(s.embedding_api_key_with(env_with(&[("OPENAI_API_KEY", "sk-env")])).as_deref(), Some("sk-env"));

        s.api_key = Some("from-file".into());
        assert_eq!(s.embedding_api_key_with(env_with(&[("OPENAI_API_KEY", "sk-env")])).as_deref(), Some("from-file"));

        s.api_key = Some("  ".into());
        assert_eq!(s.embedding_api_key_with(env_with(&[])), None, "blank keys do not count");
    }

    #[test]
    fn prod_accepts_provider_env_key() {
        let s = Settings::default();
        assert!(validate_for_env("prod", &s, env_with(&[("GEMINI_API_KEY", "g-env")])).is_ok());
        assert!(validate_for_env("prod", &s, env_with(&[])).is_err());
        assert!(validate_for_env("dev", &s, env_with(&[])).is_ok());
    }

    #[test]
    fn prod_with_fake_provider_needs_no_key() {
        let mut s = Settings::default();
        s.embedding.provider = ProviderKind::Fake;
        assert!(validate_for_env("prod", &s, env_with(&[])).is_ok());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/recall");
        assert_eq!(resolve_with_base(base, "data/a.toml"), PathBuf::from("/srv/recall/data/a.toml"));
        assert_eq!(resolve_with_base(base, "/abs/a.toml"), PathBuf::from("/abs/a.toml"));
    }
}
