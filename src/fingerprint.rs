//! Cache key derivation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Separator inserted between the image reference and the prompt before
/// hashing, so that shifting bytes across the boundary changes the digest.
const SEPARATOR: &str = "s_";

/// Deterministic identity of one (image reference, prompt) request.
///
/// A fingerprint is the lowercase-hex SHA-256 digest of the image reference,
/// a fixed separator, and the prompt. Equal inputs always derive the equal
/// fingerprint, so it doubles as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Derive the fingerprint for an (image reference, prompt) pair.
    ///
    /// Purely textual: no validation or normalization of either input is
    /// performed, and the derivation never fails.
    pub fn derive(image_ref: &str, prompt: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(image_ref.as_bytes());
        hasher.update(SEPARATOR.as_bytes());
        hasher.update(prompt.as_bytes());
        Self(format!("{:x}", hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let a = Fingerprint::derive("http://example.com/x.png", "Describe this");
        let b = Fingerprint::derive("http://example.com/x.png", "Describe this");
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_inputs_distinct_fingerprints() {
        let a = Fingerprint::derive("ref-a", "prompt");
        let b = Fingerprint::derive("ref-b", "prompt");
        let c = Fingerprint::derive("ref-a", "prompt2");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn digest_is_lowercase_hex_sha256() {
        let fp = Fingerprint::derive("data", "prompt");
        assert_eq!(fp.as_str().len(), 64);
        assert!(fp
            .as_str()
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn separator_keeps_boundary_stable() {
        // Moving bytes across the reference/prompt boundary must not collide.
        let a = Fingerprint::derive("ab", "c");
        let b = Fingerprint::derive("a", "bc");
        assert_ne!(a, b);
    }
}
