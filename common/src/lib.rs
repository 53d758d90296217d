/*!
common/src/lib.rs

Shared configuration types and helpers for Neutralscope.

This file provides:
- Config data structures (deserialized from TOML), every field defaulted
- An async loader merging a default file with an optional override file
- Environment overrides applied once at startup
- The relay data model (re-exported from `model`)
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub mod model;

pub use model::{
    Article, BiasedArticle, NeutralSummary, PredictionOutcome, RelayMode, ResponseShape,
};

/// HTTP server configuration section
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g. "0.0.0.0")
    pub address: String,
    pub port: u16,
    /// Directory holding the browser UI; `None` means the bundled `static/` directory
    pub static_dir: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 4000,
            static_dir: None,
        }
    }
}

/// News-search service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NewsConfig {
    pub api_url: String,
    /// Name of the environment variable holding the API key
    pub api_key_env: String,
    pub page_size: u32,
    pub sort_by: String,
    /// Optional ISO-639-1 language filter (e.g. "en")
    pub language: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for NewsConfig {
    fn default() -> Self {
        Self {
            api_url: "https://newsapi.org/v2/everything".to_string(),
            api_key_env: "NEWS_API_KEY".to_string(),
            page_size: 20,
            sort_by: "publishedAt".to_string(),
            language: None,
            timeout_seconds: 15,
        }
    }
}

/// Completion service configuration (OpenAI-compatible chat completions)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key_env: String,
    pub model: String,
    pub max_tokens: usize,
    pub timeout_seconds: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            max_tokens: 1000,
            timeout_seconds: 30,
        }
    }
}

/// Relay behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Mode served by `GET /api/neutral`
    pub neutral_mode: RelayMode,
    /// Check the model's JSON against the mode's expected shape before forwarding it
    pub strict_validation: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            neutral_mode: RelayMode::NeutralTop3,
            strict_validation: true,
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub news: NewsConfig,
    pub llm: LlmConfig,
    pub relay: RelayConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence). Missing files
    /// are skipped, so with neither present the built-in defaults apply.
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply process environment overrides (`PORT`).
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
        }
        Ok(())
    }

    /// Reject endpoint URLs that cannot be parsed.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.news.api_url)
            .with_context(|| format!("invalid news.api_url: {}", self.news.api_url))?;
        url::Url::parse(&self.llm.api_url)
            .with_context(|| format!("invalid llm.api_url: {}", self.llm.api_url))?;
        if self.news.page_size == 0 {
            anyhow::bail!("news.page_size must be at least 1");
        }
        Ok(())
    }

    /// Read the API key named by `env_name` from the environment. Unset, empty and
    /// whitespace-only values are all rejected.
    pub fn api_key(env_name: &str) -> Result<String> {
        api_key_from(env_name, |key| std::env::var(key).ok())
    }
}

fn api_key_from<F>(env_name: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(env_name)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty())
        .with_context(|| format!("API key env var '{}' not set or empty", env_name))
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
