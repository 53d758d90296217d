// Completion helper shared by every relay mode
use tracing::{debug, info};

use super::{strip_code_fences, LlmProvider, LlmRequest};
use crate::error::{RelayError, Result};

/// Run one completion and return the reply with any wrapping code fence removed.
pub async fn complete<P: LlmProvider + ?Sized>(provider: &P, request: LlmRequest) -> Result<String> {
    let response = provider.generate(request).await?;

    info!(
        model = %response.model,
        prompt_tokens = response.usage.prompt_tokens,
        completion_tokens = response.usage.completion_tokens,
        total_tokens = response.usage.total_tokens,
        "completion received"
    );
    debug!(raw = %response.content, "completion raw content");

    let cleaned = strip_code_fences(&response.content);
    if cleaned.is_empty() {
        return Err(RelayError::NoContent);
    }
    Ok(cleaned.to_string())
}
