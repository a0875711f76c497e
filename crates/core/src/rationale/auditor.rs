use crate::domain::market::MarketContext;
use crate::domain::product::Product;
use crate::domain::profile::ClientProfile;
use crate::domain::recommendation::{AuditResult, EvidenceSnippet, RationaleDraft};
use crate::llm::{json, TextGenerator};
use crate::rationale::normalize::normalize_audit;
use crate::rationale::{complete_or_empty, prompts};
use std::sync::Arc;
use std::time::Duration;

/// Second-pass compliance review of a draft. An unreadable review approves the draft.
#[derive(Clone)]
pub struct ComplianceAuditor {
    generator: Arc<dyn TextGenerator>,
    call_timeout: Duration,
}

impl ComplianceAuditor {
    pub fn new(generator: Arc<dyn TextGenerator>, call_timeout: Duration) -> Self {
        Self {
            generator,
            call_timeout,
        }
    }

    pub async fn audit(
        &self,
        client: &ClientProfile,
        market: &MarketContext,
        product: &Product,
        draft: &RationaleDraft,
        evidence: &[EvidenceSnippet],
    ) -> AuditResult {
        let prompt = prompts::audit_prompt(client, market, product, draft, evidence);
        let text = complete_or_empty(
            self.generator.as_ref(),
            &prompt,
            self.call_timeout,
            "audit",
            &product.product_id,
        )
        .await;
        let result = normalize_audit(&json::parse_lenient(&text));
        if !result.is_ok {
            tracing::info!(
                product_id = %product.product_id,
                issues = ?result.issues,
                "audit flagged draft; revised rationale will be used"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Goal, LiquidityNeed};
    use crate::llm::{Prompt, Provider};
    use crate::rationale::normalize::fallback_rationale;
    use std::sync::Mutex;

    /// Returns a canned reply and records the prompt it was given.
    struct Recording {
        reply: &'static str,
        seen: Mutex<Vec<Prompt>>,
    }

    #[async_trait::async_trait]
    impl TextGenerator for Recording {
        fn provider(&self) -> Provider {
            Provider::Unavailable
        }

        async fn generate(&self, prompt: &Prompt) -> anyhow::Result<String> {
            self.seen.lock().unwrap().push(prompt.clone());
            Ok(self.reply.to_string())
        }
    }

    fn inputs() -> (ClientProfile, MarketContext, Product, RationaleDraft) {
        (
            ClientProfile {
                client_id: "c".to_string(),
                risk_tolerance: 2,
                horizon_months: 12,
                goal: Goal::Preservation,
                liquidity_need: LiquidityNeed::Low,
                constraints: Default::default(),
            },
            MarketContext::default(),
            Product {
                product_id: "opp_003".to_string(),
                name: "Money Market Fund".to_string(),
                kind: "fund".to_string(),
                risk_level: 1,
                lockup_days: 1,
                fee_ratio: 0.002,
                derivatives_exposure: false,
                esg: true,
            },
            RationaleDraft {
                why_client_fit: "Guaranteed 8% return.".to_string(),
                why_market_fit: "Stable rates.".to_string(),
                key_risks: vec!["Reinvestment risk".to_string()],
                who_should_not_buy: vec!["Growth seekers".to_string()],
            },
        )
    }

    async fn audit_with(reply: &'static str) -> (AuditResult, Vec<Prompt>) {
        let generator = Arc::new(Recording {
            reply,
            seen: Mutex::new(Vec::new()),
        });
        let (client, market, product, draft) = inputs();
        let result = ComplianceAuditor::new(generator.clone(), Duration::from_secs(5))
            .audit(&client, &market, &product, &draft, &[])
            .await;
        let seen = generator.seen.lock().unwrap().clone();
        (result, seen)
    }

    #[tokio::test]
    async fn flags_and_revises() {
        let (result, seen) = audit_with(
            "{\"is_ok\": false, \"issues\": [\"guaranteed-return language\"], \"revised\": {\"why_client_fit\": \"Capital preservation focus; returns are not guaranteed.\", \"why_market_fit\": \"Stable rates.\", \"key_risks\": [\"Reinvestment risk\"], \"who_should_not_buy\": [\"Growth seekers\"]}}",
        )
        .await;
        assert!(!result.is_ok);
        assert_eq!(result.issues, vec!["guaranteed-return language"]);
        assert_eq!(
            result.revised.why_client_fit,
            "Capital preservation focus; returns are not guaranteed."
        );
        assert_eq!(seen.len(), 1);
        assert!(seen[0].user.contains("Guaranteed 8% return."));
    }

    #[tokio::test]
    async fn unparseable_review_approves() {
        let (result, _) = audit_with("Looks fine to me!").await;
        assert!(result.is_ok);
        assert!(result.issues.is_empty());
        assert_eq!(result.revised, fallback_rationale());
    }
}
