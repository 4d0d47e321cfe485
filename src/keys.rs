//! Derives stable per-source collection keys from URLs.

use std::fmt;

use sha2::{Digest, Sha256};

/// Constant tag keeping keys identifier-legal (no leading digit) and
/// recognizable in the store.
const KEY_PREFIX: &str = "collection_";

/// Number of digest bytes kept; 16 hex characters is plenty to make
/// collisions negligible for per-source namespacing.
const DIGEST_BYTES: usize = 8;

/// Identifier-safe namespace key for one source URL.
///
/// Same URL always maps to the same key. The derivation is case- and
/// scheme-sensitive: `http://x` and `https://x` get different keys.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceKey(String);

impl SourceKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hashes the URL's exact string bytes into a [`SourceKey`].
///
/// Pure function: no network, no randomness, no normalization.
pub fn derive_key(url: &str) -> SourceKey {
    let digest = Sha256::digest(url.as_bytes());
    let hex: String = digest[..DIGEST_BYTES]
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect();
    SourceKey(format!("{KEY_PREFIX}{hex}"))
}
