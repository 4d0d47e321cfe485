//! Shared data types and the crate-wide error enum.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A contiguous slice of page text that fits the token budget.
///
/// Chunks are immutable once produced: `token_count` is the token counter's
/// result for `text`, and `index` records order of appearance on the page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub index: usize,
    pub token_count: usize,
}

/// One ranked hit returned to the caller.
///
/// `relevance_score` is `1 - cosine_distance`, so higher is more relevant and
/// values stay in roughly `[0, 1]` for the cosine metric the store uses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchResult {
    pub chunk: String,
    pub relevance_score: f32,
    pub path: String,
    pub chunk_index: usize,
    pub token_count: usize,
}

/// Terminal failure of a search request, one variant per pipeline stage.
///
/// A request either yields a full ranked result list or exactly one of these;
/// partial results are never returned.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed URL or empty query, rejected before any network or index work.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The page fetcher failed (DNS, timeout, non-2xx, ...).
    #[error("failed to fetch page: {0}")]
    Fetch(String),

    /// Extraction and chunking produced zero chunks.
    ///
    /// Distinct from a valid zero-relevance result: the page had nothing to
    /// index, so there is nothing meaningful to rank.
    #[error("no indexable content found on the page")]
    EmptyContent,

    /// Embedding or storage failed while building the index.
    #[error("index build failed: {0}")]
    Index(String),

    /// Embedding or lookup failed while answering the query.
    #[error("query failed: {0}")]
    Query(String),

    /// Anything unanticipated.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SearchError {
    /// Stable machine-readable kind, used in API error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Fetch(_) => "fetch_failure",
            Self::EmptyContent => "empty_content",
            Self::Index(_) => "index_failure",
            Self::Query(_) => "query_failure",
            Self::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(SearchError::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(SearchError::Fetch("x".into()).kind(), "fetch_failure");
        assert_eq!(SearchError::EmptyContent.kind(), "empty_content");
        assert_eq!(SearchError::Index("x".into()).kind(), "index_failure");
        assert_eq!(SearchError::Query("x".into()).kind(), "query_failure");
        assert_eq!(SearchError::Internal("x".into()).kind(), "internal_error");
    }

    #[test]
    fn search_result_serializes_with_original_field_names() {
        let result = SearchResult {
            chunk: "text".into(),
            relevance_score: 0.5,
            path: "http://a.test".into(),
            chunk_index: 0,
            token_count: 1,
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("chunk").is_some());
        assert!(json.get("relevance_score").is_some());
        assert!(json.get("path").is_some());
    }
}
