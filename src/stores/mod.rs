//! Vector storage behind the [`VectorIndex`] trait.
//!
//! Entries live in named collections, one collection per source page. A
//! collection is always created as a whole, destroyed as a whole, and tagged
//! with the URL it was built from; there are no append or update semantics.

pub mod sqlite;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::keys::SourceKey;

pub use sqlite::SqliteVectorIndex;

/// Storage-level failure. Mapped to stage errors by the indexer and
/// retriever.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct StoreError(pub String);

/// Metadata carried with every stored entry and reattached to query hits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub source_url: String,
    pub chunk_index: usize,
    pub token_count: usize,
}

/// One (vector, text, metadata) tuple owned by a collection.
///
/// `id` is unique within its collection and derived from the chunk index, so
/// it is stable for the lifetime of that collection.
#[derive(Clone, Debug)]
pub struct IndexedEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub metadata: EntryMetadata,
}

/// A stored entry returned from a nearest-neighbor lookup, with its cosine
/// distance to the query vector.
#[derive(Clone, Debug)]
pub struct NearestEntry {
    pub text: String,
    pub distance: f32,
    pub metadata: EntryMetadata,
}

/// Collection-oriented vector store.
///
/// The same distance metric (cosine) is used at build and query time;
/// swapping metrics between the two would desynchronize relevance scoring.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Creates an empty collection tagged with its source URL.
    async fn create(&self, key: &SourceKey, source_url: &str) -> Result<(), StoreError>;

    /// Drops a collection and all its entries.
    ///
    /// Destroying a collection that does not exist is not an error.
    async fn destroy(&self, key: &SourceKey) -> Result<(), StoreError>;

    /// Inserts entries as one atomic batch; either all land or none do.
    async fn insert(&self, key: &SourceKey, entries: Vec<IndexedEntry>) -> Result<(), StoreError>;

    /// Returns the `k` entries nearest to `query_vector` by cosine distance,
    /// best first.
    async fn nearest(
        &self,
        key: &SourceKey,
        query_vector: &[f32],
        k: usize,
    ) -> Result<Vec<NearestEntry>, StoreError>;

    /// Number of entries currently stored in a collection.
    async fn len(&self, key: &SourceKey) -> Result<usize, StoreError>;
}
