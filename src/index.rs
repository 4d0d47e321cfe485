//! Builds a fresh vector collection for one source page.

use std::sync::Arc;

use crate::embeddings::Embedder;
use crate::keys::SourceKey;
use crate::stores::{EntryMetadata, IndexedEntry, VectorIndex};
use crate::types::{Chunk, SearchError};

/// Embeds chunks and replaces a source's collection wholesale.
pub struct Indexer {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
}

impl Indexer {
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<dyn VectorIndex>) -> Self {
        Self { embedder, index }
    }

    /// Destroys any prior collection under `key` and rebuilds it from
    /// `chunks`.
    ///
    /// Irreversibly discards the previous index content for this source.
    /// Embedding runs as one batch and entries land in one transaction, so
    /// a failure anywhere leaves no partially queryable collection behind.
    /// Callers must serialize invocations per key; see the pipeline's lock
    /// registry.
    pub async fn build(
        &self,
        key: &SourceKey,
        source_url: &str,
        chunks: &[Chunk],
    ) -> Result<(), SearchError> {
        self.index
            .destroy(key)
            .await
            .map_err(|err| SearchError::Index(err.to_string()))?;
        self.index
            .create(key, source_url)
            .await
            .map_err(|err| SearchError::Index(err.to_string()))?;

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = self
            .embedder
            .embed(&texts)
            .await
            .map_err(|err| SearchError::Index(err.to_string()))?;
        if vectors.len() != chunks.len() {
            return Err(SearchError::Index(format!(
                "embedder returned {} vectors for {} chunks",
                vectors.len(),
                chunks.len()
            )));
        }

        let entries: Vec<IndexedEntry> = chunks
            .iter()
            .zip(vectors)
            .map(|(chunk, vector)| IndexedEntry {
                id: format!("chunk_{}", chunk.index),
                vector,
                text: chunk.text.clone(),
                metadata: EntryMetadata {
                    source_url: source_url.to_string(),
                    chunk_index: chunk.index,
                    token_count: chunk.token_count,
                },
            })
            .collect();

        tracing::debug!(collection = %key, entries = entries.len(), "rebuilding collection");
        self.index
            .insert(key, entries)
            .await
            .map_err(|err| SearchError::Index(err.to_string()))
    }
}
