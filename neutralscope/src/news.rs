use chrono::{DateTime, Utc};
use common::{Article, NewsConfig};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::error::{RelayError, Result};

const SERVICE: &str = "news";

/// Source of candidate articles for a topic.
#[async_trait::async_trait]
pub trait NewsSource: Send + Sync {
    /// Search for recent articles about `topic`. Zero matches is an empty list, not an error.
    async fn search(&self, topic: &str) -> Result<Vec<Article>>;
}

/// Client for a NewsAPI-style `/v2/everything` search endpoint.
pub struct NewsApiClient {
    api_url: String,
    api_key: String,
    page_size: u32,
    sort_by: String,
    language: Option<String>,
    timeout: Duration,
    client: Client,
}

impl NewsApiClient {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            page_size: 20,
            sort_by: "publishedAt".to_string(),
            language: None,
            timeout: Duration::from_secs(15),
            client: Client::builder()
                .user_agent("Neutralscope/0.1.0")
                .build()
                .unwrap_or_default(),
        }
    }

    pub fn from_config(config: &NewsConfig, api_key: impl Into<String>) -> Self {
        let mut client = Self::new(config.api_url.clone(), api_key)
            .with_page_size(config.page_size)
            .with_timeout(config.timeout_seconds);
        client.sort_by = config.sort_by.clone();
        client.language = config.language.clone();
        client
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout = Duration::from_secs(timeout_secs);
        self
    }

    async fn fetch(&self, topic: &str) -> Result<NewsApiResponse> {
        let page_size = self.page_size.to_string();
        let mut query: Vec<(&str, &str)> = vec![
            ("q", topic),
            ("pageSize", page_size.as_str()),
            ("sortBy", self.sort_by.as_str()),
        ];
        if let Some(language) = &self.language {
            query.push(("language", language.as_str()));
        }

        let response = self
            .client
            .get(&self.api_url)
            .query(&query)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .map_err(|e| RelayError::upstream(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::upstream(
                SERVICE,
                format!("API error {}: {}", status, body),
            ));
        }

        response
            .json::<NewsApiResponse>()
            .await
            .map_err(|e| RelayError::upstream(SERVICE, format!("failed to parse response: {}", e)))
    }
}

#[async_trait::async_trait]
impl NewsSource for NewsApiClient {
    async fn search(&self, topic: &str) -> Result<Vec<Article>> {
        let body = tokio::time::timeout(self.timeout, self.fetch(topic))
            .await
            .map_err(|_| RelayError::UpstreamTimeout {
                service: SERVICE,
                seconds: self.timeout.as_secs(),
            })??;

        if body.status.as_deref() == Some("error") {
            return Err(RelayError::upstream(
                SERVICE,
                format!(
                    "{}: {}",
                    body.code.unwrap_or_default(),
                    body.message.unwrap_or_default()
                ),
            ));
        }

        let articles: Vec<Article> = body
            .articles
            .into_iter()
            .take(self.page_size as usize)
            .map(Article::from)
            .collect();

        tracing::info!(topic, count = articles.len(), "news: search complete");
        Ok(articles)
    }
}

// NewsAPI response structures
#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    articles: Vec<NewsApiArticle>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewsApiArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    published_at: Option<DateTime<Utc>>,
}

impl From<NewsApiArticle> for Article {
    fn from(a: NewsApiArticle) -> Self {
        Article {
            title: a.title.unwrap_or_default(),
            description: a.description.unwrap_or_default(),
            url: a.url.unwrap_or_default(),
            published_at: a.published_at,
        }
    }
}
