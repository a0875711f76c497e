use crate::domain::market::MarketContext;
use crate::domain::profile::ClientProfile;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TOP_K: usize = 3;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub client: ClientProfile,
    #[serde(default)]
    pub market: MarketContext,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_top_k() -> usize {
    DEFAULT_TOP_K
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSnippet {
    pub doc_id: String,
    pub snippet: String,
}

/// The four-field rationale contract. Every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RationaleDraft {
    pub why_client_fit: String,
    pub why_market_fit: String,
    pub key_risks: Vec<String>,
    pub who_should_not_buy: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditResult {
    pub is_ok: bool,
    pub issues: Vec<String>,
    pub revised: RationaleDraft,
}

impl AuditResult {
    /// The draft stands unless the auditor flagged it, in which case its revision replaces it.
    pub fn select_final(self, draft: RationaleDraft) -> RationaleDraft {
        if self.is_ok {
            draft
        } else {
            self.revised
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub product_id: String,
    pub name: String,
    pub score: f64,
    #[serde(flatten)]
    pub rationale: RationaleDraft,
    pub evidence: Vec<EvidenceSnippet>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RejectedProduct {
    pub product_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<RecommendationItem>,
    pub rejected: Vec<RejectedProduct>,
}
