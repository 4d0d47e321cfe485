//! Splits cleaned page text into token-bounded chunks.
//!
//! Sentences are detected with a punctuation heuristic (`.`, `!` or `?`
//! followed by whitespace) and greedily packed against a running token
//! budget. Sentences that individually exceed the budget are exploded into
//! words and packed the same way. The heuristic mishandles abbreviations and
//! decimals; that is an accepted approximation, not a bug to fix.

use std::sync::Arc;

use regex::Regex;

use crate::tokens::TokenCounter;
use crate::types::Chunk;

/// Default chunk budget in tokens.
pub const DEFAULT_MAX_TOKENS: usize = 500;

pub struct Chunker {
    counter: Arc<dyn TokenCounter>,
    sentence_end: Regex,
}

impl Chunker {
    pub fn new(counter: Arc<dyn TokenCounter>) -> Self {
        // Sentence boundary: terminator punctuation followed by whitespace.
        // The match is cut *after* the punctuation byte so terminators stay
        // attached to their sentence.
        let sentence_end = Regex::new(r"[.!?]\s+").expect("sentence boundary pattern is valid");
        Self {
            counter,
            sentence_end,
        }
    }

    /// Splits `text` into ordered chunks, each within `max_tokens` where
    /// possible.
    ///
    /// Identical input always yields an identical chunk sequence. Empty input
    /// yields an empty sequence. A single word whose own token cost exceeds
    /// the budget is still emitted as its own chunk; the budget is
    /// best-effort on unsplittable units.
    pub fn chunk(&self, text: &str, max_tokens: usize) -> Vec<Chunk> {
        let mut chunks: Vec<Chunk> = Vec::new();
        let mut buffer = String::new();
        let mut buffer_tokens = 0usize;

        for sentence in self.split_sentences(text) {
            let sentence_tokens = self.counter.count(sentence);

            if sentence_tokens > max_tokens {
                // Oversized sentence: pack word by word, costing each word
                // with its trailing separator since token cost is
                // context-dependent on the tokenizer.
                for word in sentence.split_whitespace() {
                    let word_tokens = self.counter.count(&format!("{word} "));
                    if buffer_tokens + word_tokens > max_tokens {
                        self.flush(&mut chunks, &mut buffer);
                        buffer_tokens = word_tokens;
                    } else {
                        buffer_tokens += word_tokens;
                    }
                    buffer.push_str(word);
                    buffer.push(' ');
                }
            } else if buffer_tokens + sentence_tokens > max_tokens {
                self.flush(&mut chunks, &mut buffer);
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_tokens = sentence_tokens;
            } else {
                buffer.push_str(sentence);
                buffer.push(' ');
                buffer_tokens += sentence_tokens;
            }
        }

        self.flush(&mut chunks, &mut buffer);
        chunks
    }

    fn split_sentences<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut sentences = Vec::new();
        let mut start = 0;
        for boundary in self.sentence_end.find_iter(text) {
            // Keep the terminator, drop the whitespace run.
            let end = boundary.start() + 1;
            sentences.push(&text[start..end]);
            start = boundary.end();
        }
        if start < text.len() {
            sentences.push(&text[start..]);
        }
        sentences
    }

    fn flush(&self, chunks: &mut Vec<Chunk>, buffer: &mut String) {
        let text = buffer.trim();
        if !text.is_empty() {
            chunks.push(Chunk {
                text: text.to_string(),
                index: chunks.len(),
                token_count: self.counter.count(text),
            });
        }
        buffer.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokens::TiktokenCounter;

    /// Counts whitespace-separated words, making budgets easy to reason about.
    struct WordCounter;

    impl TokenCounter for WordCounter {
        fn count(&self, text: &str) -> usize {
            text.split_whitespace().count()
        }
    }

    fn word_chunker() -> Chunker {
        Chunker::new(Arc::new(WordCounter))
    }

    #[test]
    fn short_text_yields_single_chunk() {
        let chunker = Chunker::new(Arc::new(TiktokenCounter::new().unwrap()));
        let chunks = chunker.chunk("Hello world. This is a test.", DEFAULT_MAX_TOKENS);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "Hello world. This is a test.");
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn empty_text_yields_no_chunks() {
        assert!(word_chunker().chunk("", DEFAULT_MAX_TOKENS).is_empty());
    }

    #[test]
    fn chunking_is_deterministic() {
        let chunker = word_chunker();
        let text = "One two three. Four five six! Seven eight? Nine ten eleven twelve.";
        let first = chunker.chunk(text, 5);
        let second = chunker.chunk(text, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn sentences_are_packed_within_budget() {
        let chunker = word_chunker();
        let text = "One two three. Four five six. Seven eight nine.";
        let chunks = chunker.chunk(text, 6);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, "One two three. Four five six.");
        assert_eq!(chunks[1].text, "Seven eight nine.");
        for chunk in &chunks {
            assert!(chunk.token_count <= 6);
        }
    }

    #[test]
    fn oversized_sentence_is_split_by_words() {
        let chunker = word_chunker();
        let text = "alpha bravo charlie delta echo foxtrot golf";
        let chunks = chunker.chunk(text, 3);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.token_count <= 3, "chunk over budget: {:?}", chunk);
        }
    }

    #[test]
    fn single_overlong_word_still_becomes_a_chunk() {
        let counter = Arc::new(TiktokenCounter::new().unwrap());
        let chunker = Chunker::new(counter.clone());
        // One unsplittable "word" that costs more than the budget.
        let word = "pneumonoultramicroscopicsilicovolcanoconiosis".repeat(4);
        let chunks = chunker.chunk(&word, 2);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, word);
        assert!(chunks[0].token_count > 2);
    }

    #[test]
    fn concatenated_chunks_reproduce_the_input() {
        let chunker = word_chunker();
        let text = "The first sentence sets the scene. The second sentence adds detail! \
                    Does the third ask a question? The fourth wraps things up nicely.";
        let chunks = chunker.chunk(text, 8);
        let rejoined = chunks
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        let normalize = |s: &str| s.split_whitespace().collect::<Vec<_>>().join(" ");
        assert_eq!(normalize(&rejoined), normalize(text));
    }

    #[test]
    fn indices_follow_order_of_appearance() {
        let chunker = word_chunker();
        let chunks = chunker.chunk("A b c. D e f. G h i.", 3);
        for (expected, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index, expected);
        }
    }

    #[test]
    fn token_count_matches_counter_for_each_chunk() {
        let counter = Arc::new(TiktokenCounter::new().unwrap());
        let chunker = Chunker::new(counter.clone());
        let text = "Rust is a systems language. It compiles to native code. \
                    Ownership makes data races impossible.";
        for chunk in chunker.chunk(text, 10) {
            assert_eq!(chunk.token_count, counter.count(&chunk.text));
        }
    }
}
