//! Search the content of a single web page semantically.
//!
//! Given a URL and a query, pagesift fetches the page, extracts its visible
//! text, splits it into token-bounded chunks, embeds the chunks into a fresh
//! per-source vector collection, and answers the query with the closest
//! chunks by cosine similarity.
//!
//! ```text
//! URL ──► fetch::PageFetcher ──► extract::TextExtractor ──► chunking::Chunker
//!                                                                 │
//!                keys::derive_key ◄───────────────────────────────┘
//!                       │
//!                       ▼
//! index::Indexer ──► stores::VectorIndex (sqlite-vec) ◄── retrieve::Retriever
//!                       ▲                                        │
//! embeddings::Embedder ─┴────────────────────────────────────────┘
//!
//! pipeline::SearchPipeline sequences the stages per request;
//! server exposes them as POST /api/search and GET /api/health.
//! ```
//!
//! Every request rebuilds the source's collection from scratch before
//! querying; there is no incremental update and no cross-request caching.
//! Concurrent requests for the same source are serialized by a per-key lock
//! so one request never observes another's half-built collection.

pub mod chunking;
pub mod config;
pub mod embeddings;
pub mod extract;
pub mod fetch;
pub mod index;
pub mod keys;
pub mod pipeline;
pub mod retrieve;
pub mod server;
pub mod stores;
pub mod tokens;
pub mod types;

pub use chunking::{Chunker, DEFAULT_MAX_TOKENS};
pub use keys::{SourceKey, derive_key};
pub use pipeline::SearchPipeline;
pub use retrieve::DEFAULT_TOP_K;
pub use types::{Chunk, SearchError, SearchResult};
