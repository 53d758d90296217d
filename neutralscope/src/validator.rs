use common::{BiasedArticle, NeutralSummary, PredictionOutcome, ResponseShape};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::{RelayError, Result};

/// Parse the cleaned model reply as JSON and, when `strict`, check it against `shape`.
///
/// The returned value is exactly what the model produced; checking never reorders or
/// drops anything.
pub fn parse_response(text: &str, shape: ResponseShape, strict: bool) -> Result<Value> {
    let malformed = |reason: String| RelayError::MalformedResponse {
        reason,
        raw: text.to_string(),
    };

    let value: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;

    if strict {
        check_shape(&value, shape).map_err(malformed)?;
    }
    Ok(value)
}

fn check_shape(value: &Value, shape: ResponseShape) -> std::result::Result<(), String> {
    match shape {
        ResponseShape::Outcomes => {
            let outcomes: Vec<PredictionOutcome> = typed(value, "array of outcomes")?;
            for o in &outcomes {
                unit_interval("probability", o.probability)?;
            }
            let total: f64 = outcomes.iter().map(|o| o.probability).sum();
            if !outcomes.is_empty() && (total - 1.0).abs() > 0.05 {
                warn!(total, "outcome probabilities do not sum to 1");
            }
        }
        ResponseShape::NeutralSummary => {
            let _: NeutralSummary = typed(value, "neutral summary object")?;
        }
        ResponseShape::BiasedArticles => {
            let articles: Vec<BiasedArticle> = typed(value, "array of scored articles")?;
            if articles.is_empty() {
                return Err("expected at least one scored article".to_string());
            }
            for a in &articles {
                unit_interval("bias_score", a.bias_score)?;
            }
            if articles.len() != 3 {
                warn!(count = articles.len(), "model returned a different number of articles than requested");
            }
            if articles.windows(2).any(|w| w[0].bias_score > w[1].bias_score) {
                warn!("scored articles are not in ascending order");
            }
        }
    }
    Ok(())
}

fn typed<T: DeserializeOwned>(value: &Value, expected: &str) -> std::result::Result<T, String> {
    T::deserialize(value).map_err(|e| format!("expected {}: {}", expected, e))
}

fn unit_interval(field: &str, x: f64) -> std::result::Result<(), String> {
    if x.is_finite() && (0.0..=1.0).contains(&x) {
        Ok(())
    } else {
        Err(format!("{} {} is outside [0, 1]", field, x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unparseable_text_keeps_the_raw_reply() {
        let err = parse_response("Sure! Here are the articles", ResponseShape::BiasedArticles, true)
            .unwrap_err();
        match err {
            RelayError::MalformedResponse { raw, .. } => assert_eq!(raw, "Sure! Here are the articles"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn scored_articles_pass_through_unchanged() {
        let text = r#"[{"title":"A","url":"http://a","bias_score":0.13},{"title":"B","url":"http://b","bias_score":0.42}]"#;
        let value = parse_response(text, ResponseShape::BiasedArticles, true).unwrap();
        assert_eq!(
            value,
            json!([
                {"title": "A", "url": "http://a", "bias_score": 0.13},
                {"title": "B", "url": "http://b", "bias_score": 0.42}
            ])
        );
    }

    #[test]
    fn extra_fields_are_forwarded() {
        let text = r#"{"title":"A","url":"http://a","neutral_summary":"s","bias_score":0.2}"#;
        let value = parse_response(text, ResponseShape::NeutralSummary, true).unwrap();
        assert_eq!(value["bias_score"], json!(0.2));
    }

    #[test]
    fn out_of_range_score_is_rejected() {
        let text = r#"[{"title":"A","url":"http://a","bias_score":1.7}]"#;
        let err = parse_response(text, ResponseShape::BiasedArticles, true).unwrap_err();
        assert!(matches!(err, RelayError::MalformedResponse { ref reason, .. } if reason.contains("bias_score")));
    }

    #[test]
    fn wrong_shape_is_rejected() {
        let text = r#"{"title":"A","url":"http://a"}"#;
        assert!(parse_response(text, ResponseShape::NeutralSummary, true).is_err());
        assert!(parse_response(text, ResponseShape::BiasedArticles, true).is_err());
        assert!(parse_response("[]", ResponseShape::BiasedArticles, true).is_err());
    }

    #[test]
    fn string_probability_is_rejected() {
        let text = r#"[{"outcome":"Yes","probability":"0.6"}]"#;
        assert!(parse_response(text, ResponseShape::Outcomes, true).is_err());
    }

    #[test]
    fn lenient_mode_only_requires_json() {
        let text = r#"{"anything": true}"#;
        let value = parse_response(text, ResponseShape::BiasedArticles, false).unwrap();
        assert_eq!(value, json!({"anything": true}));
        assert!(parse_response("nope", ResponseShape::Outcomes, false).is_err());
    }

    #[test]
    fn outcomes_in_range_are_accepted() {
        let text = r#"[{"outcome":"Passes","probability":0.65},{"outcome":"Fails","probability":0.35}]"#;
        let value = parse_response(text, ResponseShape::Outcomes, true).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(2));
    }
}
