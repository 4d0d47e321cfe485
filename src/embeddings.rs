//! Embedding providers behind a batch-oriented trait.
//!
//! Production wiring adapts any [`rig::embeddings::EmbeddingModel`]; tests use
//! the deterministic [`MockEmbedder`].

use async_trait::async_trait;
use rig::embeddings::EmbeddingModel;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Failure while embedding a batch of texts.
///
/// Deliberately kind-free: the indexer and retriever map it to their own
/// stage errors.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct EmbedError(pub String);

/// Turns texts into fixed-dimension vectors, deterministically for identical
/// input.
///
/// Batches have no partial-result semantics: either every text embeds or the
/// call fails.
#[async_trait]
pub trait Embedder: Send + Sync {
    fn dimensions(&self) -> usize;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError>;
}

/// Adapter over any rig embedding model.
#[derive(Clone)]
pub struct RigEmbedder<M: EmbeddingModel> {
    model: M,
    dimensions: usize,
}

impl<M: EmbeddingModel> RigEmbedder<M> {
    pub fn new(model: M) -> Self {
        let dimensions = model.ndims();
        Self { model, dimensions }
    }
}

#[async_trait]
impl<M> Embedder for RigEmbedder<M>
where
    M: EmbeddingModel + 'static,
{
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let embeddings = self
            .model
            .embed_texts(texts.to_vec())
            .await
            .map_err(|err| EmbedError(err.to_string()))?;
        if embeddings.len() != texts.len() {
            return Err(EmbedError(format!(
                "model returned {} vectors for {} texts",
                embeddings.len(),
                texts.len()
            )));
        }
        Ok(embeddings
            .into_iter()
            .map(|embedding| embedding.vec.into_iter().map(|v| v as f32).collect())
            .collect())
    }
}

/// Deterministic bag-of-words embedder for tests.
///
/// Each word is hashed into one of `dimensions` buckets and the resulting
/// count vector is L2-normalized, so identical texts embed identically and
/// texts sharing words land close under cosine distance. Not a semantic
/// model; good enough to exercise indexing and ranking.
#[derive(Clone, Debug)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let digest = Sha256::digest(word.as_bytes());
            let bucket = u64::from_be_bytes(
                digest[..8].try_into().expect("digest is 32 bytes"),
            ) % self.dimensions as u64;
            vector[bucket as usize] += 1.0;
        }
        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbedError> {
        Ok(texts.iter().map(|text| self.embed_one(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedding_is_deterministic() {
        let embedder = MockEmbedder::new(32);
        let texts = vec!["some chunk of text".to_string()];
        let first = embedder.embed(&texts).await.unwrap();
        let second = embedder.embed(&texts).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn mock_vectors_have_requested_dimension_and_unit_norm() {
        let embedder = MockEmbedder::new(16);
        let vectors = embedder
            .embed(&["hello world".to_string(), "another text".to_string()])
            .await
            .unwrap();
        assert_eq!(vectors.len(), 2);
        for vector in &vectors {
            assert_eq!(vector.len(), 16);
            let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn different_texts_embed_differently() {
        let embedder = MockEmbedder::new(64);
        let vectors = embedder
            .embed(&["alpha bravo".to_string(), "charlie delta".to_string()])
            .await
            .unwrap();
        assert_ne!(vectors[0], vectors[1]);
    }

    #[tokio::test]
    async fn empty_batch_embeds_to_empty() {
        let embedder = MockEmbedder::new(8);
        assert!(embedder.embed(&[]).await.unwrap().is_empty());
    }
}
