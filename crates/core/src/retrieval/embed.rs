use crate::config::Settings;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const EMBED_BATCH: usize = 64;
pub const DEFAULT_HASHING_DIMS: usize = 512;

#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    /// Identity recorded in persisted indexes; vectors from different ids are incomparable.
    fn id(&self) -> String;

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// Feature-hashed bag of words. Deterministic and offline, for local runs and tests.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dims: usize,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMS)
    }
}

impl HashingEmbedder {
    pub fn new(dims: usize) -> Self {
        Self { dims: dims.max(1) }
    }

    pub fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0.0f32; self.dims];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let h = fnv1a(&token.to_lowercase());
            let bucket = (h % self.dims as u64) as usize;
            let sign = if (h >> 63) == 0 { 1.0 } else { -1.0 };
            v[bucket] += sign;
        }
        l2_normalize(&mut v);
        v
    }
}

#[async_trait::async_trait]
impl Embedder for HashingEmbedder {
    fn id(&self) -> String {
        format!("hashing-{}", self.dims)
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for b in s.bytes() {
        h ^= u64::from(b);
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiEmbedder {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_openai_api_key()?.to_string();
        let base_url = std::env::var("OPENAI_BASE_URL")
            .unwrap_or_else(|_| crate::llm::openai::DEFAULT_BASE_URL.to_string());
        let model = std::env::var("OPENAI_EMBEDDING_MODEL")
            .unwrap_or_else(|_| DEFAULT_EMBEDDING_MODEL.to_string());
        let timeout_secs = std::env::var("OPENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build embeddings http client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    async fn embed_batch(&self, batch: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let url = format!("{}/v1/embeddings", self.base_url.trim_end_matches('/'));
        let res = self
            .http
            .post(url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: batch,
            })
            .send()
            .await
            .context("embeddings request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read embeddings response")?;
        anyhow::ensure!(status.is_success(), "embeddings HTTP {status}: {text}");

        let parsed = serde_json::from_str::<EmbeddingResponse>(&text)
            .context("failed to decode embeddings response")?;
        ordered_embeddings(parsed, batch.len())
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiEmbedder {
    fn id(&self) -> String {
        format!("openai:{}", self.model)
    }

    async fn embed(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for (batch_idx, batch) in texts.chunks(EMBED_BATCH).enumerate() {
            let t0 = std::time::Instant::now();
            out.extend(self.embed_batch(batch).await?);
            tracing::debug!(
                batch_idx,
                batch_size = batch.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "embeddings batch"
            );
        }
        Ok(out)
    }
}

/// OpenAI embeddings when a key is configured, otherwise the offline hashing embedder.
pub fn embedder_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn Embedder>> {
    if settings.openai_api_key.is_some() {
        return Ok(Arc::new(OpenAiEmbedder::from_settings(settings)?));
    }
    tracing::warn!("OPENAI_API_KEY not set; using offline hashing embeddings for retrieval");
    Ok(Arc::new(HashingEmbedder::default()))
}

fn ordered_embeddings(res: EmbeddingResponse, expected: usize) -> anyhow::Result<Vec<Vec<f32>>> {
    anyhow::ensure!(
        res.data.len() == expected,
        "embeddings response has {} vectors for {expected} inputs",
        res.data.len()
    );
    let mut data = res.data;
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}
