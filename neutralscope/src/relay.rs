use common::RelayMode;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, Instrument};

use crate::error::{RelayError, Result};
use crate::llm::{completion, LlmProvider, LlmRequest};
use crate::news::NewsSource;
use crate::{prompt, validator};

/// One pass per request: validate topic, search news, prompt the model, check the reply.
///
/// Holds no per-request state; the collaborators are shared read-only between requests.
pub struct Relay {
    news: Arc<dyn NewsSource>,
    llm: Arc<dyn LlmProvider>,
    max_tokens: usize,
    strict_validation: bool,
}

impl Relay {
    pub fn new(news: Arc<dyn NewsSource>, llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            news,
            llm,
            max_tokens: 1000,
            strict_validation: true,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict_validation = strict;
        self
    }

    pub fn model(&self) -> &str {
        self.llm.model()
    }

    pub async fn run(&self, topic: Option<&str>, mode: RelayMode) -> Result<Value> {
        let topic = topic
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(RelayError::BadRequest)?;

        let span = tracing::info_span!(
            "relay",
            request_id = %uuid::Uuid::new_v4(),
            mode = %mode,
        );
        self.run_topic(topic, mode).instrument(span).await
    }

    async fn run_topic(&self, topic: &str, mode: RelayMode) -> Result<Value> {
        info!(topic, "relay: fetching articles");
        let articles = self.news.search(topic).await?;
        if articles.is_empty() && mode.requires_articles() {
            return Err(RelayError::NotFound);
        }

        let request = LlmRequest {
            system: Some(mode.system_role().to_string()),
            prompt: prompt::build_prompt(topic, &articles, mode),
            max_tokens: Some(self.max_tokens),
            temperature: Some(mode.temperature()),
            timeout_seconds: None,
        };

        let reply = completion::complete(self.llm.as_ref(), request).await?;
        let value = validator::parse_response(&reply, mode.shape(), self.strict_validation)?;
        info!(articles = articles.len(), "relay: completed");
        Ok(value)
    }
}
