//! Content hashing
//!
//! Every "has this changed" decision in the crate compares these digests;
//! source timestamps are never trusted for that.

use sha2::{Digest, Sha256};

/// Normalize text before hashing: CRLF line endings become LF and trailing
/// whitespace is dropped, so editors that add a final newline do not count
/// as a change.
pub fn canonical_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end().to_string()
}

/// Lowercase hex SHA-256 of the canonical form of `text`
pub fn content_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_text(text).as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_stable_hex() {
        let hash = content_hash("hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(
            hash,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_hash_ignores_line_ending_and_trailing_whitespace() {
        assert_eq!(content_hash("a\r\nb\n\n"), content_hash("a\nb"));
        assert_ne!(content_hash("a\nb"), content_hash("a b"));
    }
}
