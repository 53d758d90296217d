//! Relay data model: articles coming in from the news service, the shapes the
//! language model is asked to answer with, and the relay modes tying them together.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Candidate article returned by the news-search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub title: String,
    /// May be empty when the source provides no description
    #[serde(default)]
    pub description: String,
    pub url: String,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
}

/// Article rated by the model; lower `bias_score` = more neutral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasedArticle {
    pub title: String,
    pub url: String,
    pub bias_score: f64,
}

/// Single least-biased article, rewritten neutrally by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeutralSummary {
    pub title: String,
    pub url: String,
    pub neutral_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionOutcome {
    pub outcome: String,
    pub probability: f64,
}

/// JSON shape a mode expects back from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseShape {
    /// Array of `PredictionOutcome`
    Outcomes,
    /// One `NeutralSummary` object
    NeutralSummary,
    /// Array of `BiasedArticle`
    BiasedArticles,
}

/// What a relay run asks the model for.
///
/// Every endpoint goes through the same orchestration; the mode only selects the prompt
/// template, the expected response shape, the completion parameters and whether an empty
/// article list ends the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelayMode {
    Predict,
    NeutralPick,
    NeutralTop3,
}

impl RelayMode {
    pub fn shape(self) -> ResponseShape {
        match self {
            RelayMode::Predict => ResponseShape::Outcomes,
            RelayMode::NeutralPick => ResponseShape::NeutralSummary,
            RelayMode::NeutralTop3 => ResponseShape::BiasedArticles,
        }
    }

    pub fn system_role(self) -> &'static str {
        match self {
            RelayMode::Predict => "You are a helpful assistant.",
            RelayMode::NeutralPick | RelayMode::NeutralTop3 => "You are an unbiased news editor.",
        }
    }

    pub fn temperature(self) -> f32 {
        match self {
            RelayMode::Predict => 0.7,
            RelayMode::NeutralPick | RelayMode::NeutralTop3 => 0.3,
        }
    }

    /// Neutral modes have nothing to rate without articles; predict still asks the model.
    pub fn requires_articles(self) -> bool {
        !matches!(self, RelayMode::Predict)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelayMode::Predict => "predict",
            RelayMode::NeutralPick => "neutral-pick",
            RelayMode::NeutralTop3 => "neutral-top3",
        }
    }
}

impl std::fmt::Display for RelayMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modes_select_their_parameters() {
        assert_eq!(RelayMode::Predict.shape(), ResponseShape::Outcomes);
        assert_eq!(RelayMode::NeutralPick.shape(), ResponseShape::NeutralSummary);
        assert_eq!(RelayMode::NeutralTop3.shape(), ResponseShape::BiasedArticles);

        assert!(!RelayMode::Predict.requires_articles());
        assert!(RelayMode::NeutralPick.requires_articles());
        assert!(RelayMode::NeutralTop3.requires_articles());

        assert!(RelayMode::NeutralTop3.temperature() < RelayMode::Predict.temperature());
        assert!(RelayMode::NeutralPick.system_role().contains("unbiased news editor"));
        assert!(RelayMode::Predict.system_role().contains("helpful assistant"));
    }

    #[test]
    fn mode_names_round_trip_through_serde() {
        let mode: RelayMode = serde_json::from_str("\"neutral-top3\"").unwrap();
        assert_eq!(mode, RelayMode::NeutralTop3);
        assert_eq!(serde_json::to_string(&RelayMode::NeutralPick).unwrap(), "\"neutral-pick\"");
        assert_eq!(RelayMode::Predict.to_string(), "predict");
    }

    #[test]
    fn article_description_defaults_to_empty() {
        let article: Article =
            serde_json::from_str(r#"{"title":"T","url":"http://t"}"#).unwrap();
        assert_eq!(article.description, "");
        assert!(article.published_at.is_none());
    }
}
