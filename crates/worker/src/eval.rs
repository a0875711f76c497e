use anyhow::Context;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::Path;

use oppmatch_core::domain::market::{MarketContext, RateTrend, VolatilityLevel};
use oppmatch_core::domain::profile::ClientProfile;
use oppmatch_core::domain::recommendation::{RecommendRequest, RecommendResponse};
use oppmatch_core::pipeline::MatchingPipeline;

pub const EVAL_TOP_K: usize = 3;

/// Reference regimes: stressed, neutral, benign.
pub const REGIMES: [(RateTrend, VolatilityLevel); 3] = [
    (RateTrend::Rising, VolatilityLevel::High),
    (RateTrend::Stable, VolatilityLevel::Medium),
    (RateTrend::Falling, VolatilityLevel::Low),
];

pub fn load_clients(path: &Path) -> anyhow::Result<Vec<ClientProfile>> {
    let raw = std::fs::read_to_string(path)?;
    parse_clients(&raw)
}

pub fn parse_clients(raw: &str) -> anyhow::Result<Vec<ClientProfile>> {
    serde_json::from_str(raw).context("clients file must be a JSON array of client profiles")
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EvalSummary {
    pub total_runs: usize,
    pub with_evidence: usize,
    pub total_recommendations: usize,
    pub total_rejected: usize,
    pub clients: usize,
    pub market_sensitive_clients: usize,
}

impl EvalSummary {
    /// Counts one run. Evidence coverage looks at the top pick only.
    pub fn record(&mut self, res: &RecommendResponse) {
        self.total_runs += 1;
        self.total_recommendations += res.recommendations.len();
        self.total_rejected += res.rejected.len();
        if res
            .recommendations
            .first()
            .is_some_and(|top| !top.evidence.is_empty())
        {
            self.with_evidence += 1;
        }
    }

    pub fn evidence_coverage(&self) -> f64 {
        ratio(self.with_evidence, self.total_runs)
    }

    pub fn avg_recommendations(&self) -> f64 {
        ratio(self.total_recommendations, self.total_runs)
    }

    pub fn avg_rejected(&self) -> f64 {
        ratio(self.total_rejected, self.total_runs)
    }

    pub fn market_sensitive_ratio(&self) -> f64 {
        ratio(self.market_sensitive_clients, self.clients)
    }
}

impl fmt::Display for EvalSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Evaluation Summary ===")?;
        writeln!(f, "Total runs: {}", self.total_runs)?;
        writeln!(f, "Evidence coverage rate: {:.2}%", self.evidence_coverage() * 100.0)?;
        writeln!(f, "Avg recommendations per run: {:.2}", self.avg_recommendations())?;
        writeln!(f, "Avg rejected per run: {:.2}", self.avg_rejected())?;
        writeln!(
            f,
            "Market-sensitive top1 ratio: {:.2}%",
            self.market_sensitive_ratio() * 100.0
        )
    }
}

fn ratio(n: usize, d: usize) -> f64 {
    if d == 0 {
        0.0
    } else {
        n as f64 / d as f64
    }
}

/// Top pick per client id, one map per regime.
pub type TopPicks = BTreeMap<String, String>;

/// Clients whose top pick (or lack of one) is not the same in every regime.
pub fn count_market_sensitive(by_regime: &[TopPicks], client_ids: &BTreeSet<String>) -> usize {
    client_ids
        .iter()
        .filter(|id| {
            let picks: BTreeSet<Option<&str>> = by_regime
                .iter()
                .map(|m| m.get(id.as_str()).map(String::as_str))
                .collect();
            picks.len() > 1
        })
        .count()
}

pub async fn run(pipeline: &MatchingPipeline, clients: &[ClientProfile]) -> EvalSummary {
    let mut summary = EvalSummary::default();
    let mut by_regime = Vec::with_capacity(REGIMES.len());

    for (trend, volatility) in REGIMES {
        let market = MarketContext::new(trend, volatility);
        let mut top_picks = TopPicks::new();

        for client in clients {
            let req = RecommendRequest {
                client: client.clone(),
                market: market.clone(),
                top_k: EVAL_TOP_K,
            };
            if let Err(e) = req.validate() {
                tracing::warn!(client_id = %client.client_id, error = %e, "skipping invalid client");
                continue;
            }

            let res = pipeline.recommend(&req).await;
            summary.record(&res);
            if let Some(top) = res.recommendations.first() {
                top_picks.insert(client.client_id.clone(), top.product_id.clone());
            }
        }

        tracing::info!(
            rate = %trend,
            volatility = %volatility,
            clients_with_picks = top_picks.len(),
            "regime evaluated"
        );
        by_regime.push(top_picks);
    }

    let client_ids: BTreeSet<String> = clients.iter().map(|c| c.client_id.clone()).collect();
    summary.clients = client_ids.len();
    summary.market_sensitive_clients = count_market_sensitive(&by_regime, &client_ids);
    summary
}
