//! Sealing properties across payload sizes and tampering positions.

use std::sync::OnceLock;

use evidence_lib::keys::KeyPair;
use evidence_lib::seal::{is_sealed_layout, seal, unseal, SealedBlob, HEADER_LEN, IV_LEN, TAG_LEN};
use evidence_lib::{fingerprint, EvidenceError};

fn recipient() -> &'static KeyPair {
    static PAIR: OnceLock<KeyPair> = OnceLock::new();
    PAIR.get_or_init(|| KeyPair::generate().unwrap())
}

fn payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i.wrapping_mul(31) ^ (i >> 8)) as u8).collect()
}

fn assert_rejected(blob: &[u8], context: &str) {
    assert!(
        matches!(unseal(blob, recipient().private_key()), Err(EvidenceError::DecryptionFailed)),
        "{context}: tampered blob was accepted"
    );
}

#[test]
fn test_roundtrip_across_sizes() {
    let pair = recipient();
    for len in [0usize, 1, 4096, 10_000_000] {
        let data = payload(len);
        let blob = seal(&data, pair.public_key()).unwrap();

        assert_eq!(blob.len(), HEADER_LEN + pair.wrapped_key_len() + len);
        assert!(is_sealed_layout(&blob));
        assert_eq!(unseal(&blob, pair.private_key()).unwrap(), data, "size {len}");
    }
}

#[test]
fn test_every_tag_bit_is_checked() {
    let blob = seal(&payload(4096), recipient().public_key()).unwrap();
    for bit in 0..TAG_LEN * 8 {
        let mut tampered = blob.clone();
        tampered[IV_LEN + bit / 8] ^= 1 << (bit % 8);
        assert_rejected(&tampered, &format!("tag bit {bit}"));
    }
}

#[test]
fn test_ciphertext_bit_flips_are_detected() {
    let blob = seal(&payload(4096), recipient().public_key()).unwrap();
    let start = SealedBlob::parse(&blob).unwrap().encoded_len() - 4096;

    for offset in [0, 1, 15, 16, 2047, 4094, 4095] {
        for bit in [0, 3, 7] {
            let mut tampered = blob.clone();
            tampered[start + offset] ^= 1 << bit;
            assert_rejected(&tampered, &format!("ciphertext byte {offset} bit {bit}"));
        }
    }
}

#[test]
fn test_iv_and_key_length_tampering_detected() {
    let blob = seal(b"hello world!", recipient().public_key()).unwrap();

    for index in 0..IV_LEN {
        let mut tampered = blob.clone();
        tampered[index] ^= 0x80;
        assert_rejected(&tampered, &format!("iv byte {index}"));
    }

    for length in [0u16, 1, 255, 257, u16::MAX] {
        let mut tampered = blob.clone();
        tampered[IV_LEN + TAG_LEN..HEADER_LEN].copy_from_slice(&length.to_be_bytes());
        assert_rejected(&tampered, &format!("key length {length}"));
    }
}

#[test]
fn test_appended_bytes_detected() {
    let mut blob = seal(b"hello world!", recipient().public_key()).unwrap();
    blob.push(0);
    assert_rejected(&blob, "appended byte");
}

#[test]
fn test_fingerprint_differs_per_seal() {
    // Fresh randomness per seal means identical evidence never shares a fingerprint.
    let pair = recipient();
    let a = seal(b"same memo", pair.public_key()).unwrap();
    let b = seal(b"same memo", pair.public_key()).unwrap();
    assert_ne!(fingerprint(&a), fingerprint(&b));
}
