//! Content-based hashing for document ids.

use bom_core::DocId;
use sha2::{Digest, Sha256};

/// `DOC-` followed by the first 16 hex digits of SHA-256(title + text).
///
/// Re-uploading the same document yields the same id.
pub fn document_id(title: &str, text: &str) -> DocId {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update(text.as_bytes());
    let digest = format!("{:x}", hasher.finalize());
    DocId::new(format!("DOC-{}", &digest[..16]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_stability() {
        let a = document_id("X15 Integration", "boost >= 45 psi");
        let b = document_id("X15 Integration", "boost >= 45 psi");
        assert_eq!(a, b);
        assert!(a.as_str().starts_with("DOC-"));
        assert_eq!(a.as_str().len(), 4 + 16);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let a = document_id("X15 Integration", "boost >= 45 psi");
        let b = document_id("X15 Integration", "boost >= 50 psi");
        assert_ne!(a, b);
    }

    #[test]
    fn known_digest_prefix() {
        // sha256("abc") = ba7816bf8f01cfea...
        assert_eq!(document_id("a", "bc").as_str(), "DOC-ba7816bf8f01cfea");
    }
}
