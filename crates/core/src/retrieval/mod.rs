pub mod embed;
pub mod index;

use crate::domain::market::MarketContext;
use crate::domain::profile::ClientProfile;
use crate::domain::recommendation::EvidenceSnippet;
use std::sync::Arc;

/// Maximum characters kept from each retrieved passage.
pub const SNIPPET_MAX_CHARS: usize = 400;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexHit {
    pub doc_id: String,
    pub text: String,
}

/// Nearest-neighbour text search. Hits come back most similar first.
#[async_trait::async_trait]
pub trait SemanticIndex: Send + Sync {
    async fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<IndexHit>>;
}

#[derive(Clone)]
pub struct EvidenceRetriever {
    index: Arc<dyn SemanticIndex>,
}

impl EvidenceRetriever {
    pub fn new(index: Arc<dyn SemanticIndex>) -> Self {
        Self { index }
    }

    /// Zero hits is a valid answer. An index failure is logged and treated the same way.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<EvidenceSnippet> {
        if k == 0 {
            return Vec::new();
        }

        let hits = match self.index.similarity_search(query, k).await {
            Ok(hits) => hits,
            Err(err) => {
                tracing::warn!(error = %err, "evidence search failed; continuing without evidence");
                return Vec::new();
            }
        };

        hits.into_iter()
            .take(k)
            .map(|hit| EvidenceSnippet {
                doc_id: hit.doc_id,
                snippet: truncate_chars(&hit.text, SNIPPET_MAX_CHARS),
            })
            .collect()
    }
}

pub fn evidence_query(client: &ClientProfile, market: &MarketContext, product_name: &str) -> String {
    format!(
        "Client goal={}, horizon={} months, risk={}. Market rate={}, vol={}. {}",
        client.goal,
        client.horizon_months,
        client.risk_tolerance,
        market.interest_rate_trend,
        market.volatility_level,
        product_name
    )
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}
