//! Test fixtures and data generators.

use std::sync::OnceLock;

use crate::keys::KeyPair;

static SHARED: OnceLock<KeyPair> = OnceLock::new();
static OTHER: OnceLock<KeyPair> = OnceLock::new();

/// A key pair shared by every test in the binary.
///
/// RSA generation dominates test time, so tests that only need "a valid
/// recipient" should use this instead of generating their own.
pub fn shared_key_pair() -> &'static KeyPair {
    SHARED.get_or_init(|| KeyPair::generate().expect("RSA key generation"))
}

/// A second key pair distinct from [`shared_key_pair`], for wrong-key cases.
pub fn other_key_pair() -> &'static KeyPair {
    OTHER.get_or_init(|| KeyPair::generate().expect("RSA key generation"))
}

/// Deterministic, non-repeating payload of `len` bytes.
pub fn sample_evidence(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            // xorshift32
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state >> 24) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_evidence_is_deterministic() {
        assert_eq!(sample_evidence(64), sample_evidence(64));
        assert_eq!(sample_evidence(0), Vec::<u8>::new());
        assert_ne!(sample_evidence(32)[..16], sample_evidence(32)[16..]);
    }
}
