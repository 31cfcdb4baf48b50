//! Content checksums for conflict detection.

use md5::{Digest, Md5};

/// Computes the checksum of document content.
///
/// MD5 over the exact UTF-8 bytes, lowercase hex. This is a conflict
/// detection fingerprint, not an integrity mechanism; it is wire-visible
/// and clients compute the same value over their shadow before a patch
/// round. No normalization is applied to the content.
#[must_use]
pub fn checksum(content: &str) -> String {
    let digest = Md5::digest(content.as_bytes());
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_digests() {
        assert_eq!(checksum("hello"), "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(checksum(""), "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn deterministic() {
        assert_eq!(checksum("same input"), checksum("same input"));
    }

    #[test]
    fn no_line_ending_normalization() {
        assert_ne!(checksum("a\nb"), checksum("a\r\nb"));
    }

    #[test]
    fn exact_unicode_bytes() {
        assert_ne!(checksum("café"), checksum("cafe"));
    }
}
