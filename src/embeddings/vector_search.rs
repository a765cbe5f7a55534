// In-memory similarity search over schema snippets

use super::embedder::Embedder;
use crate::types::{AppError, AppResult};
use async_trait::async_trait;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::{debug, info};

/// Context Retriever capability: most relevant snippets for a query.
#[async_trait]
pub trait ContextRetriever: Send + Sync {
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<String>>;
}

struct IndexedSnippet {
    text: String,
    embedding: Vec<f32>,
}

/// Snippets embedded once at startup, ranked by cosine similarity per query.
pub struct SchemaIndex {
    embedder: Arc<dyn Embedder>,
    snippets: Vec<IndexedSnippet>,
}

impl SchemaIndex {
    pub async fn build(embedder: Arc<dyn Embedder>, snippets: Vec<String>) -> AppResult<Self> {
        let embeddings = embedder.embed(&snippets).await?;
        if embeddings.len() != snippets.len() {
            return Err(AppError::Retrieval(format!(
                "Embedder returned {} vectors for {} snippets",
                embeddings.len(),
                snippets.len()
            )));
        }

        let snippets: Vec<IndexedSnippet> = snippets
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| IndexedSnippet { text, embedding })
            .collect();

        info!(snippets = snippets.len(), "Schema index built");
        Ok(Self { embedder, snippets })
    }

    pub fn is_empty(&self) -> bool {
        self.snippets.is_empty()
    }
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

#[async_trait]
impl ContextRetriever for SchemaIndex {
    async fn search(&self, query: &str, top_k: usize) -> AppResult<Vec<String>> {
        if self.snippets.is_empty() || top_k == 0 {
            return Ok(Vec::new());
        }

        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Retrieval("Embedder returned no vector for query".into()))?;

        let mut scored: Vec<(f32, &IndexedSnippet)> = self
            .snippets
            .iter()
            .map(|s| (cosine_similarity(&query_vec, &s.embedding), s))
            .collect();
        // Stable sort keeps catalog order on ties.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        let results: Vec<String> = scored
            .into_iter()
            .take(top_k)
            .map(|(_, s)| s.text.clone())
            .collect();
        debug!(top_k, returned = results.len(), "Schema search complete");
        Ok(results)
    }
}
