use common::{Article, RelayMode};

/// Build the instruction sent to the model for `topic` and its candidate articles.
///
/// Every template demands ONLY valid JSON in a literal shape: the reply is parsed
/// strictly and there is no recovery from prose around the JSON.
pub fn build_prompt(topic: &str, articles: &[Article], mode: RelayMode) -> String {
    match mode {
        RelayMode::Predict => predict_prompt(topic, articles),
        RelayMode::NeutralPick => neutral_pick_prompt(topic, articles),
        RelayMode::NeutralTop3 => neutral_top3_prompt(topic, articles),
    }
}

fn predict_prompt(topic: &str, articles: &[Article]) -> String {
    let snippets = articles
        .iter()
        .map(|a| format!("{} — {}", a.title, a.description))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Given the news snippets below about \"{}\", estimate probabilities (that sum to 1) for the most likely outcomes.\n",
        topic
    ));
    prompt.push_str(
        "Return ONLY valid JSON: an array of {\"outcome\": string, \"probability\": 0-1} objects.\n",
    );
    prompt.push_str("Do not wrap the JSON in markdown or add any other text.\n\n");
    prompt.push_str("News Snippets:\n");
    prompt.push_str(&snippets);
    prompt
}

/// Numbered title/description/URL listing shared by the neutral modes
fn article_listing(articles: &[Article]) -> String {
    let mut listing = String::new();
    for (i, article) in articles.iter().enumerate() {
        listing.push_str(&format!("{}. Title: {}\n", i + 1, article.title));
        listing.push_str(&format!("   Description: {}\n", article.description));
        listing.push_str(&format!("   URL: {}\n", article.url));
    }
    listing
}

fn neutral_pick_prompt(topic: &str, articles: &[Article]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Below are recent news articles about \"{}\".\n\n",
        topic
    ));
    prompt.push_str(&article_listing(articles));
    prompt.push_str("\nRate the political and editorial bias of each article on a scale from 0 (completely neutral) to 1 (extremely biased).\n");
    prompt.push_str("Select the single article with the lowest bias score and rewrite its content as a short, strictly neutral summary.\n");
    prompt.push_str("Return ONLY valid JSON in exactly this shape, with no markdown and no other text:\n");
    prompt.push_str("{\"title\": \"<article title>\", \"url\": \"<article url>\", \"neutral_summary\": \"<neutral summary>\"}\n");
    prompt
}

fn neutral_top3_prompt(topic: &str, articles: &[Article]) -> String {
    let mut prompt = String::new();
    prompt.push_str(&format!(
        "Below are recent news articles about \"{}\".\n\n",
        topic
    ));
    prompt.push_str(&article_listing(articles));
    prompt.push_str("\nGive each article a bias score strictly between 0 and 1, where lower means more neutral.\n");
    prompt.push_str("Every score must have at least two decimal digits (for example 0.17 or 0.42).\n");
    prompt.push_str("Never use 0, never use 1, and never round to a single decimal such as 0.3.\n");
    prompt.push_str("Return only the 3 articles with the lowest scores, ordered from lowest to highest score.\n");
    prompt.push_str("Return ONLY valid JSON in exactly this shape, with no markdown and no other text:\n");
    prompt.push_str("[{\"title\": \"<article title>\", \"url\": \"<article url>\", \"bias_score\": 0.17}]\n");
    prompt
}
