//! Generate-then-audit rationale stage.
//!
//! Neither stage trusts the generative component: transport errors, deadlines and malformed
//! output all collapse into an empty response, which the normalizer turns into fallback content.

pub mod auditor;
pub mod drafter;
pub mod normalize;
pub mod prompts;

pub use auditor::ComplianceAuditor;
pub use drafter::RationaleDrafter;

use crate::llm::error::ProviderHttpError;
use crate::llm::{Prompt, TextGenerator};
use std::time::Duration;

/// Runs one generation under a deadline. Errors and timeouts become empty text.
pub(crate) async fn complete_or_empty(
    generator: &dyn TextGenerator,
    prompt: &Prompt,
    deadline: Duration,
    stage: &'static str,
    product_id: &str,
) -> String {
    match tokio::time::timeout(deadline, generator.generate(prompt)).await {
        Ok(Ok(text)) => text,
        Ok(Err(err)) => {
            if let Some(http) = err.downcast_ref::<ProviderHttpError>() {
                tracing::debug!(
                    stage,
                    product_id,
                    status = http.status,
                    body_is_json = http.body_json.is_some(),
                    body = %http.body,
                    "provider rejected generation request"
                );
            }
            tracing::warn!(
                stage,
                product_id,
                provider = %generator.provider(),
                error = %err,
                "generation failed; using fallback content"
            );
            String::new()
        }
        Err(_) => {
            tracing::warn!(
                stage,
                product_id,
                provider = %generator.provider(),
                deadline_ms = deadline.as_millis() as u64,
                "generation timed out; using fallback content"
            );
            String::new()
        }
    }
}
