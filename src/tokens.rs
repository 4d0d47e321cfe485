//! Token counting behind a trait so the chunker can be tested with fakes.

use tiktoken_rs::CoreBPE;

use crate::types::SearchError;

/// Deterministic text-to-length function.
///
/// One scheme must be used for the lifetime of an index; mixing schemes
/// between chunking and stored token counts would desynchronize the budget
/// accounting.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;
}

/// `cl100k_base` BPE counter.
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    pub fn new() -> Result<Self, SearchError> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|err| SearchError::Internal(format!("failed to load cl100k_base: {err}")))?;
        Ok(Self { bpe })
    }
}

impl TokenCounter for TiktokenCounter {
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_are_deterministic() {
        let counter = TiktokenCounter::new().unwrap();
        let text = "The quick brown fox jumps over the lazy dog.";
        assert_eq!(counter.count(text), counter.count(text));
    }

    #[test]
    fn empty_text_counts_zero() {
        let counter = TiktokenCounter::new().unwrap();
        assert_eq!(counter.count(""), 0);
        assert!(counter.count("hello world") > 0);
    }
}
