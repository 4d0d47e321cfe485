//! Answers a query against one source's collection.

use std::sync::Arc;

use crate::embeddings::Embedder;
use crate::keys::SourceKey;
use crate::stores::VectorIndex;
use crate::types::{SearchError, SearchResult};

/// Default number of results per query, capped by the collection size.
pub const DEFAULT_TOP_K: usize = 10;

pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Embeds `query_text` and returns up to `k` ranked results, best first.
    ///
    /// The store's ranking is preserved as-is; relevance is `1 - distance`,
    /// which only stays within `[0, 1]` for a bounded metric like cosine.
    /// Out-of-range scores are logged rather than silently clamped.
    pub async fn query(
        &self,
        key: &SourceKey,
        query_text: &str,
        k: usize,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let vectors = self
            .embedder
            .embed(&[query_text.to_string()])
            .await
            .map_err(|err| SearchError::Query(err.to_string()))?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| SearchError::Query("embedder returned no vector for query".into()))?;

        let available = self
            .index
            .len(key)
            .await
            .map_err(|err| SearchError::Query(err.to_string()))?;
        let limit = k.min(available);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let neighbors = self
            .index
            .nearest(key, &query_vector, limit)
            .await
            .map_err(|err| SearchError::Query(err.to_string()))?;

        Ok(neighbors
            .into_iter()
            .map(|entry| {
                let relevance_score = 1.0 - entry.distance;
                if !(0.0..=1.0).contains(&relevance_score) {
                    tracing::warn!(
                        score = relevance_score,
                        "relevance score outside [0, 1]; distance metric may be unbounded"
                    );
                }
                SearchResult {
                    chunk: entry.text,
                    relevance_score,
                    path: entry.metadata.source_url,
                    chunk_index: entry.metadata.chunk_index,
                    token_count: entry.metadata.token_count,
                }
            })
            .collect())
    }
}
