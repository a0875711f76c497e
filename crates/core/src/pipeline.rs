//! Per-request orchestration: filter, score, shortlist, then retrieve, draft and audit each
//! shortlisted candidate concurrently before the final rank and truncation.

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::domain::market::MarketContext;
use crate::domain::product::Product;
use crate::domain::profile::ClientProfile;
use crate::domain::recommendation::{RecommendRequest, RecommendResponse, RecommendationItem};
use crate::llm::{generator_from_settings, TextGenerator, UnavailableGenerator};
use crate::matching::{filter_eligible, resolve_market_weights, score_product};
use crate::rationale::{ComplianceAuditor, RationaleDrafter};
use crate::retrieval::embed::embedder_from_settings;
use crate::retrieval::index::VectorIndex;
use crate::retrieval::{evidence_query, EvidenceRetriever, SemanticIndex};
use anyhow::Context;
use std::cmp::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const DEFAULT_EVIDENCE_K: usize = 4;
const DEFAULT_MAX_CONCURRENCY: usize = 4;
const DEFAULT_LLM_CALL_TIMEOUT_SECS: u64 = 30;

const SHORTLIST_MULTIPLIER: usize = 3;
const SHORTLIST_FLOOR: usize = 6;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Evidence snippets fetched per candidate.
    pub evidence_k: usize,

    /// Candidates processed at once through retrieve, draft and audit.
    pub max_concurrency: usize,

    /// Deadline for each generative call. Expiry is handled like malformed output.
    pub llm_call_timeout: Duration,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            evidence_k: DEFAULT_EVIDENCE_K,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            llm_call_timeout: Duration::from_secs(DEFAULT_LLM_CALL_TIMEOUT_SECS),
        }
    }
}

impl PipelineOptions {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Unparseable values keep their defaults. Concurrency and the call deadline floor at 1.
    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let mut out = Self::default();

        if let Some(n) = var("EVIDENCE_K").and_then(|s| s.parse::<usize>().ok()) {
            out.evidence_k = n;
        }

        if let Some(n) = var("MATCH_MAX_CONCURRENCY").and_then(|s| s.parse::<usize>().ok()) {
            out.max_concurrency = n.max(1);
        }

        if let Some(n) = var("LLM_CALL_TIMEOUT_SECS").and_then(|s| s.parse::<u64>().ok()) {
            out.llm_call_timeout = Duration::from_secs(n.max(1));
        }

        out
    }
}

/// Collaborators shared for the life of the process. Nothing here is mutated per request.
#[derive(Clone)]
pub struct MatchingContext {
    pub catalog: Arc<Catalog>,
    pub index: Arc<dyn SemanticIndex>,
    pub generator: Arc<dyn TextGenerator>,
}

impl MatchingContext {
    /// Loads the catalog and the evidence index, and picks a generator. A missing generator is
    /// not fatal: the service runs in degraded mode with fallback rationales.
    pub async fn from_settings(settings: &Settings, force_rebuild_index: bool) -> anyhow::Result<Self> {
        let catalog = Catalog::from_csv_path(&settings.catalog_path)?;

        let embedder = embedder_from_settings(settings)?;
        let index = VectorIndex::load_or_build(
            &settings.docs_dir,
            &settings.index_path,
            embedder,
            force_rebuild_index,
        )
        .await
        .context("failed to prepare evidence index")?;

        let generator: Arc<dyn TextGenerator> = match generator_from_settings(settings)? {
            Some(generator) => {
                tracing::info!(provider = %generator.provider(), "text generator configured");
                generator
            }
            None => {
                tracing::warn!(
                    "no LLM provider configured; running in degraded mode with fallback rationales"
                );
                Arc::new(UnavailableGenerator)
            }
        };

        Ok(Self {
            catalog: Arc::new(catalog),
            index: Arc::new(index),
            generator,
        })
    }
}

/// Number of top-scored candidates sent through generation for a requested `top_k`.
pub fn shortlist_len(top_k: usize) -> usize {
    (top_k.saturating_mul(SHORTLIST_MULTIPLIER)).max(SHORTLIST_FLOOR)
}

pub struct MatchingPipeline {
    catalog: Arc<Catalog>,
    retriever: EvidenceRetriever,
    drafter: RationaleDrafter,
    auditor: ComplianceAuditor,
    options: PipelineOptions,
}

impl MatchingPipeline {
    pub fn new(ctx: MatchingContext, options: PipelineOptions) -> Self {
        Self {
            catalog: ctx.catalog,
            retriever: EvidenceRetriever::new(ctx.index),
            drafter: RationaleDrafter::new(ctx.generator.clone(), options.llm_call_timeout),
            auditor: ComplianceAuditor::new(ctx.generator, options.llm_call_timeout),
            options,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs one request end to end. Callers validate the request first; past that point
    /// nothing here fails, it degrades to fallback content instead.
    pub async fn recommend(&self, req: &RecommendRequest) -> RecommendResponse {
        let client = Arc::new(req.client.clone());
        let market = Arc::new(req.market.clone());

        let eligibility = filter_eligible(&client, self.catalog.products());
        tracing::info!(
            client_id = %client.client_id,
            eligible = eligibility.eligible.len(),
            rejected = eligibility.rejected.len(),
            "eligibility filtered"
        );
        if eligibility.eligible.is_empty() {
            return RecommendResponse {
                recommendations: Vec::new(),
                rejected: eligibility.rejected,
            };
        }

        let weights = resolve_market_weights(&market);
        let mut scored: Vec<(f64, Product)> = eligibility
            .eligible
            .into_iter()
            .map(|p| (score_product(&client, &p, &weights), p))
            .collect();
        // Stable sort: equal scores keep catalog order.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        scored.truncate(shortlist_len(req.top_k));

        tracing::debug!(
            client_id = %client.client_id,
            ?weights,
            shortlist = scored.len(),
            "scored and shortlisted"
        );

        let mut items = self.explain_shortlist(client.clone(), market, scored).await;
        items.sort_by(|a, b| {
            b.1.score
                .partial_cmp(&a.1.score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        items.truncate(req.top_k);

        tracing::info!(
            client_id = %client.client_id,
            recommendations = items.len(),
            "recommendation complete"
        );

        RecommendResponse {
            recommendations: items.into_iter().map(|(_, item)| item).collect(),
            rejected: eligibility.rejected,
        }
    }

    /// Fans the shortlist out with bounded parallelism and joins every candidate before
    /// returning. Each item is paired with its shortlist position.
    async fn explain_shortlist(
        &self,
        client: Arc<ClientProfile>,
        market: Arc<MarketContext>,
        shortlist: Vec<(f64, Product)>,
    ) -> Vec<(usize, RecommendationItem)> {
        let permits = Arc::new(Semaphore::new(self.options.max_concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (position, (score, product)) in shortlist.into_iter().enumerate() {
            let candidate = Candidate {
                client: client.clone(),
                market: market.clone(),
                retriever: self.retriever.clone(),
                drafter: self.drafter.clone(),
                auditor: self.auditor.clone(),
                evidence_k: self.options.evidence_k,
            };
            let permits = permits.clone();
            tasks.spawn(async move {
                // The semaphore is never closed, so acquisition only fails if that changes.
                let _permit = permits.acquire_owned().await.ok();
                (position, candidate.explain(score, product).await)
            });
        }

        let mut items = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(item) => items.push(item),
                Err(err) => {
                    tracing::error!(error = %err, "candidate task failed; dropping candidate");
                }
            }
        }
        items
    }
}

/// Everything one candidate needs, owned so it can run on its own task.
struct Candidate {
    client: Arc<ClientProfile>,
    market: Arc<MarketContext>,
    retriever: EvidenceRetriever,
    drafter: RationaleDrafter,
    auditor: ComplianceAuditor,
    evidence_k: usize,
}

impl Candidate {
    /// Retrieve, then draft, then audit. Strictly in that order.
    async fn explain(self, score: f64, product: Product) -> RecommendationItem {
        let query = evidence_query(&self.client, &self.market, &product.name);
        let evidence = self.retriever.retrieve(&query, self.evidence_k).await;

        let draft = self
            .drafter
            .draft(&self.client, &self.market, &product, &evidence)
            .await;
        let audit = self
            .auditor
            .audit(&self.client, &self.market, &product, &draft, &evidence)
            .await;

        tracing::debug!(
            product_id = %product.product_id,
            score,
            evidence = evidence.len(),
            audit_ok = audit.is_ok,
            "candidate explained"
        );

        RecommendationItem {
            product_id: product.product_id,
            name: product.name,
            score,
            rationale: audit.select_final(draft),
            evidence,
        }
    }
}
