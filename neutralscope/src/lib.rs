// Library interface for neutralscope modules
// This allows tests and other binaries to import modules

pub mod error;
pub mod llm;
pub mod news;
pub mod prompt;
pub mod relay;
pub mod server;
pub mod validator;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use common::{Config, RelayMode};
use tracing::{error, info};

/// Load `config.default.toml`, then `config_arg` or else `config.toml`, from the working
/// directory. Applies the `PORT` override, then `port_arg`.
pub async fn load_config(config_arg: Option<PathBuf>, port_arg: Option<u16>) -> Result<Config> {
    load_config_in(Path::new("."), config_arg, port_arg).await
}

async fn load_config_in(dir: &Path, config_arg: Option<PathBuf>, port_arg: Option<u16>) -> Result<Config> {
    // Resolve config paths
    let default_path = dir.join("config.default.toml");

    let override_path = if let Some(p) = config_arg {
        if !p.exists() {
            error!(path = ?p, "config file given on the command line does not exist");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = dir.join("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    // Load configuration with defaults
    let mut config = match Config::load_with_defaults(Some(default_path.as_path()), override_path.as_deref()).await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(%e, "failed to load configuration");
            return Err(e);
        }
    };
    config.apply_env_overrides()?;
    if let Some(port) = port_arg {
        config.server.port = port;
    }
    info!(default = ?default_path, override = ?override_path, "configuration loaded");

    Ok(config)
}

/// Build the relay with live news and completion clients. API keys are read from the
/// environment variables named in the configuration.
pub fn relay_from_config(config: &Config) -> Result<relay::Relay> {
    let news_key = Config::api_key(&config.news.api_key_env)?;
    let llm_key = Config::api_key(&config.llm.api_key_env)?;

    let news = news::NewsApiClient::from_config(&config.news, news_key);
    let llm = llm::remote::RemoteLlmProvider::new(
        config.llm.api_url.clone(),
        llm_key,
        config.llm.model.clone(),
    )
    .with_defaults(
        config.llm.timeout_seconds,
        config.llm.max_tokens,
        RelayMode::Predict.temperature(),
    );

    Ok(relay::Relay::new(Arc::new(news), Arc::new(llm))
        .with_max_tokens(config.llm.max_tokens)
        .with_strict_validation(config.relay.strict_validation))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn config_toml_is_read_without_a_flag() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(
            dir.path().join("config.default.toml"),
            "[llm]\nmodel = \"gpt-4o-mini\"\n[news]\npage_size = 10\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("config.toml"), "[news]\nlanguage = \"en\"\n").unwrap();

        let cfg = load_config_in(dir.path(), None, Some(4100)).await.expect("load config");
        assert_eq!(cfg.llm.model, "gpt-4o-mini");
        assert_eq!(cfg.news.page_size, 10);
        assert_eq!(cfg.news.language.as_deref(), Some("en"));
        assert_eq!(cfg.server.port, 4100);
    }

    #[tokio::test]
    async fn explicit_config_replaces_config_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("config.toml"), "[news]\nlanguage = \"en\"\n").unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "[news]\nlanguage = \"fr\"\n").unwrap();

        let cfg = load_config_in(dir.path(), Some(custom), Some(4100)).await.expect("load config");
        assert_eq!(cfg.news.language.as_deref(), Some("fr"));

        let missing = dir.path().join("missing.toml");
        assert!(load_config_in(dir.path(), Some(missing), None).await.is_err());
    }
}
