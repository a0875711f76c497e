use crate::domain::market::MarketContext;
use crate::domain::product::Product;
use crate::domain::profile::ClientProfile;
use crate::domain::recommendation::{EvidenceSnippet, RationaleDraft};
use crate::llm::{json, TextGenerator};
use crate::rationale::normalize::normalize_rationale;
use crate::rationale::{complete_or_empty, prompts};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct RationaleDrafter {
    generator: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl RationaleDrafter {
    pub fn new(generator: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self {
            generator,
            call_timeout,
        }
    }

    pub async fn draft(
        &self,
        client: &ClientProfile,
        market: &MarketContext,
        product: &Product,
        evidence: &[EvidenceSnippet],
    ) -> RationaleDraft {
        let prompt = prompts::draft_prompt(client, market, product, evidence);
        let text = complete_or_empty(
            self.generator.as_ref(),
            &prompt,
            self.call_timeout,
            "draft",
            &product.product_id,
        )
        .await;
        normalize_rationale(&json::parse_lenient(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Goal, LiquidityNeed};
    use crate::llm::{Prompt, Provider};
    use crate::rationale::normalize::{fallback_rationale, FALLBACK_MARKET_FIT};

    struct Canned(&'static str);

    #[async_trait::async_trait]
    impl TextGenerator for Canned {
        fn provider(&self) -> Provider {
            Provider::Unavailable
        }

        async fn generate(&self, _prompt: &Prompt) -> anyhow::Result<String> {
            Ok(self.0.to_string())
        }
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl TextGenerator for Stalled {
        fn provider(&self) -> Provider {
            Provider::Unavailable
        }

        async fn generate(&self, _prompt: &Prompt) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("{\"why_client_fit\": \"too late\"}".to_string())
        }
    }

    struct RateLimited;

    #[async_trait::async_trait]
    impl TextGenerator for RateLimited {
        fn provider(&self) -> Provider {
            Provider::Anthropic
        }

        async fn generate(&self, _prompt: &Prompt) -> anyhow::Result<String> {
            Err(crate::llm::error::ProviderHttpError::new(
                Provider::Anthropic,
                reqwest::StatusCode::TOO_MANY_REQUESTS,
                r#"{"error":{"type":"rate_limit_error","message":"slow down"}}"#.to_string(),
            )
            .into())
        }
    }

    fn inputs() -> (ClientProfile, MarketContext, Product) {
        (
            ClientProfile {
                client_id: "c".to_string(),
                risk_tolerance: 3,
                horizon_months: 24,
                goal: Goal::Growth,
                liquidity_need: LiquidityNeed::Med,
                constraints: Default::default(),
            },
            MarketContext::default(),
            Product {
                product_id: "opp_006".to_string(),
                name: "Global Dividend Equity Fund".to_string(),
                kind: "fund".to_string(),
                risk_level: 3,
                lockup_days: 30,
                fee_ratio: 0.009,
                derivatives_exposure: false,
                esg: true,
            },
        )
    }

    async fn draft_with(generator: Arc<dyn TextGenerator>) -> RationaleDraft {
        let (client, market, product) = inputs();
        RationaleDrafter::new(generator, Duration::from_secs(5))
            .draft(&client, &market, &product, &[])
            .await
    }

    #[tokio::test]
    async fn parses_fenced_partial_output() {
        let r = draft_with(Arc::new(Canned(
            "Here it is:\n```json\n{\"why_client_fit\": \"Balanced risk.\", \"key_risks\": [\"NAV swings\"]}\n```",
        )))
        .await;
        assert_eq!(r.why_client_fit, "Balanced risk.");
        assert_eq!(r.key_risks, vec!["NAV swings"]);
        assert_eq!(r.why_market_fit, FALLBACK_MARKET_FIT);
    }

    #[tokio::test]
    async fn refusal_text_becomes_fallback() {
        let r = draft_with(Arc::new(Canned("I cannot help with that"))).await;
        assert_eq!(r, fallback_rationale());
    }

    #[tokio::test]
    async fn generator_error_becomes_fallback() {
        let r = draft_with(Arc::new(crate::llm::UnavailableGenerator)).await;
        assert_eq!(r, fallback_rationale());
    }

    #[tokio::test]
    async fn provider_http_error_becomes_fallback() {
        let r = draft_with(Arc::new(RateLimited)).await;
        assert_eq!(r, fallback_rationale());
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_becomes_fallback() {
        let r = draft_with(Arc::new(Stalled)).await;
        assert_eq!(r, fallback_rationale());
    }
}
