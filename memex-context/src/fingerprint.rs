//! Content fingerprints for chunk deduplication.
//!
//! A fingerprint is the blake3 digest of a chunk's text, truncated to 16
//! bytes. That prefix is long enough to make an accidental collision
//! negligible at the corpus sizes memex targets (tens of thousands of
//! chunks), and short enough to serve as a cheap uniqueness key in the
//! chunk table. The same text always fingerprints identically across
//! processes and runs, which is what makes re-indexing idempotent.

use std::fmt;

/// Truncated digest length in bytes.
pub const FINGERPRINT_LEN: usize = 16;

/// Deterministic fingerprint of a chunk's text.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Fingerprint the given text.
    pub fn of(text: &str) -> Self {
        let digest = blake3::hash(text.as_bytes());
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&digest.as_bytes()[..FINGERPRINT_LEN]);
        Self(bytes)
    }

    /// Reconstruct a fingerprint from stored bytes.
    /// Returns `None` if the slice is not exactly [`FINGERPRINT_LEN`] bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        let array: [u8; FINGERPRINT_LEN] = bytes.try_into().ok()?;
        Some(Self(array))
    }

    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_text_same_fingerprint() {
        assert_eq!(Fingerprint::of("hello world"), Fingerprint::of("hello world"));
    }

    #[test]
    fn different_text_different_fingerprint() {
        assert_ne!(Fingerprint::of("hello world"), Fingerprint::of("hello worlds"));
    }

    #[test]
    fn hex_is_stable_and_sized() {
        let fp = Fingerprint::of("stable");
        assert_eq!(fp.to_hex().len(), FINGERPRINT_LEN * 2);
        assert_eq!(fp.to_hex(), Fingerprint::of("stable").to_hex());
    }

    #[test]
    fn roundtrip_through_bytes() {
        let fp = Fingerprint::of("roundtrip");
        let restored = Fingerprint::from_bytes(fp.as_bytes()).unwrap();
        assert_eq!(fp, restored);

        assert!(Fingerprint::from_bytes(&[0u8; 3]).is_none());
    }
}
