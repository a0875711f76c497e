use crate::domain::market::MarketContext;
use crate::domain::product::Product;
use crate::domain::profile::ClientProfile;
use crate::domain::recommendation::{EvidenceSnippet, RationaleDraft};
use crate::llm::Prompt;

const RATIONALE_SCHEMA: &str = "{\"why_client_fit\": string, \"why_market_fit\": string, \"key_risks\": [string], \"who_should_not_buy\": [string]}";

fn draft_system_prompt() -> String {
    [
        "You are a conservative wealth management assistant.",
        "Do NOT promise returns. Use cautious language.",
        "Always include key risks and who should not buy.",
        "You MUST output strictly valid JSON only (no markdown, no extra text).",
        "If evidence is insufficient, explicitly say so in the reasons.",
    ]
    .join(" ")
}

fn audit_system_prompt() -> String {
    [
        "You are a strict compliance reviewer for wealth management recommendations.",
        "Check for: (1) guaranteed-return language, (2) missing risk disclosures,",
        "(3) suitability violations vs the client profile, (4) claims not supported by evidence.",
        "You MUST output strictly valid JSON only (no markdown, no extra text).",
    ]
    .join(" ")
}

pub fn draft_prompt(
    client: &ClientProfile,
    market: &MarketContext,
    product: &Product,
    evidence: &[EvidenceSnippet],
) -> Prompt {
    Prompt {
        system: draft_system_prompt(),
        user: format!(
            "Client profile (JSON):\n{}\n\n\
Market context (JSON):\n{}\n\n\
Candidate product (JSON):\n{}\n\n\
Evidence snippets (JSON list):\n{}\n\n\
Task: Output JSON ONLY with this schema:\n{RATIONALE_SCHEMA}",
            to_json(client),
            to_json(market),
            to_json(product),
            to_json(evidence),
        ),
    }
}

pub fn audit_prompt(
    client: &ClientProfile,
    market: &MarketContext,
    product: &Product,
    draft: &RationaleDraft,
    evidence: &[EvidenceSnippet],
) -> Prompt {
    Prompt {
        system: audit_system_prompt(),
        user: format!(
            "Client (JSON):\n{}\n\n\
Market (JSON):\n{}\n\n\
Product (JSON):\n{}\n\n\
Draft recommendation (JSON):\n{}\n\n\
Evidence snippets (JSON list):\n{}\n\n\
Output JSON ONLY with this schema:\n\
{{\"is_ok\": boolean, \"issues\": [string], \"revised\": {RATIONALE_SCHEMA}}}",
            to_json(client),
            to_json(market),
            to_json(product),
            to_json(draft),
            to_json(evidence),
        ),
    }
}

// Domain types are plain data; serialization cannot fail for them.
fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "null".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::profile::{Goal, LiquidityNeed};
    use crate::rationale::normalize::fallback_rationale;

    fn fixtures() -> (ClientProfile, MarketContext, Product, Vec<EvidenceSnippet>) {
        let client = ClientProfile {
            client_id: "c_007".to_string(),
            risk_tolerance: 2,
            horizon_months: 18,
            goal: Goal::Income,
            liquidity_need: LiquidityNeed::Med,
            constraints: ["ESG-only".to_string()].into_iter().collect(),
        };
        let product = Product {
            product_id: "opp_001".to_string(),
            name: "Short Duration Bond Fund".to_string(),
            kind: "fund".to_string(),
            risk_level: 2,
            lockup_days: 7,
            fee_ratio: 0.006,
            derivatives_exposure: false,
            esg: true,
        };
        let evidence = vec![EvidenceSnippet {
            doc_id: "opp_001".to_string(),
            snippet: "Designed for income.".to_string(),
        }];
        (client, MarketContext::default(), product, evidence)
    }

    #[test]
    fn draft_prompt_embeds_context_and_schema() {
        let (client, market, product, evidence) = fixtures();
        let p = draft_prompt(&client, &market, &product, &evidence);
        assert!(p.system.contains("Do NOT promise returns"));
        assert!(p.user.contains("\"client_id\":\"c_007\""));
        assert!(p.user.contains("\"interest_rate_trend\":\"stable\""));
        assert!(p.user.contains("Short Duration Bond Fund"));
        assert!(p.user.contains("Designed for income."));
        assert!(p.user.contains("\"who_should_not_buy\": [string]"));
    }

    #[test]
    fn audit_prompt_embeds_draft() {
        let (client, market, product, evidence) = fixtures();
        let draft = fallback_rationale();
        let p = audit_prompt(&client, &market, &product, &draft, &evidence);
        assert!(p.system.contains("guaranteed-return language"));
        assert!(p.user.contains("Draft recommendation"));
        assert!(p.user.contains("unable to generate a reliable client-fit rationale"));
        assert!(p.user.contains("{\"is_ok\": boolean, \"issues\": [string], \"revised\": {"));
    }
}
