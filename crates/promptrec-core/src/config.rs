//! Configuration loader, typed settings and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nested keys, e.g. `APP_RECOMMEND__TOP_K=5`). Every section
//! has serde defaults so an absent file yields a working configuration. A
//! `[categories]` table replaces the built-in dictionary as a whole.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Category name → keywords that signal it.
pub type CategoryDictionary = BTreeMap<String, Vec<String>>;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    /// Build from an inline TOML document layered over the defaults.
    pub fn from_toml_str(toml: &str) -> anyhow::Result<Self> {
        let figment = Figment::new().merge(Toml::string(toml));
        let config = Self { figment };
        config.validate()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }

    fn validate(&self) -> anyhow::Result<()> {
        self.settings()?.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub data: DataSettings,
    #[serde(default)]
    pub recommend: RecommendSettings,
    #[serde(default)]
    pub embedding: EmbeddingSettings,
    #[serde(default)]
    pub index: IndexSettings,
    #[serde(default = "default_categories")]
    pub categories: CategoryDictionary,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            recommend: RecommendSettings::default(),
            embedding: EmbeddingSettings::default(),
            index: IndexSettings::default(),
            categories: default_categories(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        let r = &self.recommend;
        if r.top_k == 0 {
            return Err(Error::InvalidConfig("recommend.top_k must be greater than 0".into()));
        }
        if r.candidate_factor == 0 {
            return Err(Error::InvalidConfig("recommend.candidate_factor must be greater than 0".into()));
        }
        if !(r.keyword_weight.is_finite() && r.vector_weight.is_finite()) || r.keyword_weight < 0.0 || r.vector_weight < 0.0 {
            return Err(Error::InvalidConfig("recommend weights must be finite and non-negative".into()));
        }
        if self.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be greater than 0".into()));
        }
        if self.embedding.backend == EmbeddingBackend::Fake && self.embedding.fake_dim == 0 {
            return Err(Error::InvalidConfig("embedding.fake_dim must be greater than 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    /// JSON file or directory of JSON files holding the prompt collection.
    pub prompts_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { prompts_path: "data/prompts.json".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendSettings {
    pub top_k: usize,
    pub keyword_weight: f32,
    pub vector_weight: f32,
    /// Hybrid mode asks each ranker for `top_k * candidate_factor` items.
    pub candidate_factor: usize,
    pub rebuild_timeout_ms: u64,
}

impl Default for RecommendSettings {
    fn default() -> Self {
        Self { top_k: 3, keyword_weight: 0.4, vector_weight: 0.6, candidate_factor: 2, rebuild_timeout_ms: 30_000 }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Model,
    Fake,
}

/// Where the sentence model runs. `metal` needs the `metal` build feature
/// and falls back to CPU without it.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DevicePreference {
    #[default]
    Auto,
    Cpu,
    Metal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub backend: EmbeddingBackend,
    pub device: DevicePreference,
    /// Directory with `config.json`, `tokenizer.json` and weights. Empty
    /// means "search the usual locations".
    pub model_dir: String,
    pub max_len: usize,
    pub fake_dim: usize,
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self { backend: EmbeddingBackend::Model, device: DevicePreference::Auto, model_dir: String::new(), max_len: 256, fake_dim: 384, batch_size: 32 }
    }
}

/// How the index decides that its cached snapshot still matches the
/// prompt collection.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FingerprintMode {
    /// Ordered prompt ids and count. Edits that keep ids do not rebuild.
    #[default]
    Identity,
    /// Ids plus the full indexed text of every prompt.
    Content,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub fingerprint: FingerprintMode,
    /// Snapshot file; empty disables the on-disk cache.
    pub cache_path: String,
    pub show_progress: bool,
}

pub fn default_categories() -> CategoryDictionary {
    let entries: [(&str, &[&str]); 6] = [
        ("프론트엔드", &["ui", "폼", "리액트", "react", "tailwind", "상태", "프론트"]),
        ("백엔드", &["api", "로그인", "fastapi", "서버", "rest", "인증"]),
        ("AI/LLM", &["gpt", "llm", "요약", "langchain", "llama", "프롬프트"]),
        ("데이터분석", &["pandas", "시각화", "csv", "plotly", "분석", "데이터"]),
        ("DevOps", &["docker", "배포", "ci", "github actions"]),
        ("기초", &["홀수", "짝수", "기초", "python", "입문"]),
    ];
    entries
        .into_iter()
        .map(|(cat, kws)| (cat.to_string(), kws.iter().map(|k| (*k).to_string()).collect()))
        .collect()
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

/// `None` for an empty setting, otherwise the expanded path resolved
/// against `base`.
pub fn optional_path(base: &Path, p: &str) -> Option<PathBuf> {
    if p.trim().is_empty() { None } else { Some(resolve_with_base(base, p)) }
}
