use crate::retrieval::embed::Embedder;
use crate::retrieval::{IndexHit, SemanticIndex};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{BufReader, BufWriter};
use std::path::Path;
use std::sync::Arc;

pub const CHUNK_SIZE: usize = 450;
pub const CHUNK_OVERLAP: usize = 80;

const DOC_EXTENSIONS: [&str; 2] = ["md", "txt"];

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    doc_id: String,
    text: String,
    vector: Vec<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedIndex {
    embedder: String,
    chunks: Vec<IndexedChunk>,
}

/// In-memory chunk store ranked by cosine similarity. Read-only once built.
pub struct VectorIndex {
    embedder: Arc<dyn Embedder>,
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    pub async fn build(
        documents: Vec<(String, String)>,
        embedder: Arc<dyn Embedder>,
    ) -> anyhow::Result<Self> {
        let mut doc_ids = Vec::new();
        let mut texts = Vec::new();
        for (doc_id, text) in documents {
            for chunk in chunk_text(&text, CHUNK_SIZE, CHUNK_OVERLAP) {
                doc_ids.push(doc_id.clone());
                texts.push(chunk);
            }
        }

        let vectors = embedder
            .embed(&texts)
            .await
            .context("failed to embed document chunks")?;
        anyhow::ensure!(
            vectors.len() == texts.len(),
            "embedder returned {} vectors for {} chunks",
            vectors.len(),
            texts.len()
        );

        let chunks = doc_ids
            .into_iter()
            .zip(texts)
            .zip(vectors)
            .map(|((doc_id, text), vector)| IndexedChunk {
                doc_id,
                text,
                vector,
            })
            .collect();

        Ok(Self { embedder, chunks })
    }

    pub async fn build_from_dir(docs_dir: &Path, embedder: Arc<dyn Embedder>) -> anyhow::Result<Self> {
        let documents = load_documents(docs_dir)?;
        tracing::info!(
            docs_dir = %docs_dir.display(),
            documents = documents.len(),
            "building vector index"
        );
        Self::build(documents, embedder).await
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let file = std::fs::File::create(path)
            .with_context(|| format!("failed to create index file {}", path.display()))?;
        let persisted = PersistedIndex {
            embedder: self.embedder.id(),
            chunks: self.chunks.clone(),
        };
        serde_json::to_writer(BufWriter::new(file), &persisted)
            .with_context(|| format!("failed to write index file {}", path.display()))?;
        Ok(())
    }

    /// Returns `None` when the file was written by a different embedder.
    pub fn load(path: &Path, embedder: Arc<dyn Embedder>) -> anyhow::Result<Option<Self>> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("failed to open index file {}", path.display()))?;
        let persisted: PersistedIndex = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("failed to parse index file {}", path.display()))?;

        if persisted.embedder != embedder.id() {
            tracing::warn!(
                path = %path.display(),
                stored = %persisted.embedder,
                current = %embedder.id(),
                "persisted index was built with a different embedder"
            );
            return Ok(None);
        }

        Ok(Some(Self {
            embedder,
            chunks: persisted.chunks,
        }))
    }

    /// Loads the persisted index when usable, otherwise builds from `docs_dir` and persists it.
    pub async fn load_or_build(
        docs_dir: &Path,
        index_path: &Path,
        embedder: Arc<dyn Embedder>,
        force_rebuild: bool,
    ) -> anyhow::Result<Self> {
        if !force_rebuild && index_path.exists() {
            if let Some(index) = Self::load(index_path, embedder.clone())? {
                tracing::info!(path = %index_path.display(), chunks = index.len(), "loaded vector index");
                return Ok(index);
            }
        }

        let index = Self::build_from_dir(docs_dir, embedder).await?;
        index.save(index_path)?;
        tracing::info!(path = %index_path.display(), chunks = index.len(), "persisted vector index");
        Ok(index)
    }
}

#[async_trait::async_trait]
impl SemanticIndex for VectorIndex {
    async fn similarity_search(&self, query: &str, k: usize) -> anyhow::Result<Vec<IndexHit>> {
        if k == 0 || self.chunks.is_empty() {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .context("embedder returned no vector for query")?;

        let mut scored: Vec<(f32, &IndexedChunk)> = self
            .chunks
            .iter()
            .map(|c| (cosine(&query_vec, &c.vector), c))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(_, c)| IndexHit {
                doc_id: c.doc_id.clone(),
                text: c.text.clone(),
            })
            .collect())
    }
}

/// Reads `.md` / `.txt` files; the file stem is the document id. Sorted by id.
pub fn load_documents(dir: &Path) -> anyhow::Result<Vec<(String, String)>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read docs dir {}", dir.display()))?;

    let mut out = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let ext_ok = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| DOC_EXTENSIONS.contains(&e));
        if !path.is_file() || !ext_ok {
            continue;
        }
        let Some(doc_id) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        out.push((doc_id.to_string(), text));
    }

    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
}

/// Word-boundary windows of at most `size` characters, each starting with up to `overlap`
/// characters from the end of the previous window.
pub fn chunk_text(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let mut end = start;
        let mut len = 0;
        while end < words.len() {
            let add = words[end].chars().count() + usize::from(end > start);
            if end > start && len + add > size {
                break;
            }
            len += add;
            end += 1;
        }
        chunks.push(words[start..end].join(" "));
        if end >= words.len() {
            break;
        }

        let mut next = end;
        let mut carried = 0;
        while next > start + 1 {
            let add = words[next - 1].chars().count() + 1;
            if carried + add > overlap {
                break;
            }
            carried += add;
            next -= 1;
        }
        start = next;
    }

    chunks
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}
