use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Core trait for completion providers
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate completion for a given prompt
    async fn generate(&self, request: LlmRequest) -> Result<LlmResponse>;

    /// Model name reported in status output
    fn model(&self) -> &str;
}

/// Request structure for LLM generation
#[derive(Debug, Clone)]
pub struct LlmRequest {
    /// System role message sent ahead of the prompt
    pub system: Option<String>,
    pub prompt: String,
    pub max_tokens: Option<usize>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
}

/// Response from LLM generation
#[derive(Debug, Clone)]
pub struct LlmResponse {
    pub content: String,
    pub usage: UsageMetadata,
    pub model: String,
}

/// Token usage metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UsageMetadata {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

pub mod completion;
pub mod remote;

/// Remove a markdown code fence wrapped around the whole reply (```json ... ``` or
/// ``` ... ```) together with surrounding whitespace. Text without a fence is only trimmed.
pub fn strip_code_fences(text: &str) -> &str {
    let mut s = text.trim();

    if let Some(rest) = s.strip_prefix("```") {
        s = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
    }
    if let Some(rest) = s.strip_suffix("```") {
        s = rest;
    }

    s.trim()
}
