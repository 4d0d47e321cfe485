//! The per-request pipeline: fetch, extract, chunk, key, index, query.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;
use url::Url;

use crate::chunking::{Chunker, DEFAULT_MAX_TOKENS};
use crate::embeddings::Embedder;
use crate::extract::TextExtractor;
use crate::fetch::PageFetcher;
use crate::index::Indexer;
use crate::keys::{SourceKey, derive_key};
use crate::retrieve::{DEFAULT_TOP_K, Retriever};
use crate::stores::VectorIndex;
use crate::types::{SearchError, SearchResult};

/// Per-key mutual exclusion for the destroy/rebuild/query section.
///
/// Two concurrent requests for the same source must not interleave their
/// index rebuilds, or one could query a half-built or just-destroyed
/// collection belonging to the other. Requests for different sources run
/// freely in parallel.
#[derive(Clone, Default)]
pub struct KeyedLocks {
    inner: Arc<Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: &SourceKey) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock();
            map.entry(key.as_str().to_string())
                .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Sequences one search request from URL to ranked results.
///
/// Every collaborator is injected at construction, so tests can substitute
/// fakes for the embedder, the store, or the token counter. Each request
/// runs the full pipeline fresh: there is no caching across requests, and
/// the source's collection is rebuilt from scratch every time.
pub struct SearchPipeline {
    fetcher: PageFetcher,
    extractor: TextExtractor,
    chunker: Chunker,
    indexer: Indexer,
    retriever: Retriever,
    locks: KeyedLocks,
    max_tokens: usize,
    top_k: usize,
}

impl SearchPipeline {
    pub fn new(
        fetcher: PageFetcher,
        extractor: TextExtractor,
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            chunker,
            indexer: Indexer::new(embedder.clone(), index.clone()),
            retriever: Retriever::new(embedder, index),
            locks: KeyedLocks::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            top_k: DEFAULT_TOP_K,
        }
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    #[must_use]
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Runs the whole pipeline for one request.
    ///
    /// Stages run strictly in order with no retries; the first failure maps
    /// to its stage's [`SearchError`] kind and ends the request.
    pub async fn search(
        &self,
        url: &str,
        query: &str,
    ) -> Result<Vec<SearchResult>, SearchError> {
        let parsed = validate_url(url)?;
        if query.trim().is_empty() {
            return Err(SearchError::InvalidInput("query must not be empty".into()));
        }

        tracing::info!(url, "processing search request");

        let markup = self.fetcher.fetch(&parsed).await?;
        let text = self.extractor.extract(&markup);
        let chunks = self.chunker.chunk(&text, self.max_tokens);
        if chunks.is_empty() {
            return Err(SearchError::EmptyContent);
        }
        tracing::info!(chunk_count = chunks.len(), "chunked page content");

        // Key and metadata use the caller's exact URL string, not the
        // normalized form, so "http://x" and "http://x/" stay distinct.
        let key = derive_key(url);

        let _guard = self.locks.acquire(&key).await;
        self.indexer.build(&key, url, &chunks).await?;
        let results = self.retriever.query(&key, query, self.top_k).await?;

        tracing::info!(result_count = results.len(), "returning ranked results");
        Ok(results)
    }
}

fn validate_url(raw: &str) -> Result<Url, SearchError> {
    let url = Url::parse(raw)
        .map_err(|err| SearchError::InvalidInput(format!("invalid URL '{raw}': {err}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(SearchError::InvalidInput(format!(
            "unsupported URL scheme '{}': use http:// or https://",
            url.scheme()
        )));
    }
    if url.host_str().is_none() {
        return Err(SearchError::InvalidInput("URL must include a host".into()));
    }
    Ok(url)
}
