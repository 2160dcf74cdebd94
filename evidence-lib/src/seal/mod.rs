//! Hybrid sealing of evidence blobs.
//!
//! Each seal draws a fresh AES-256 key and a fresh 16-byte IV, encrypts the
//! payload with AES-256-GCM and wraps the AES key under the recipient's RSA
//! public key with OAEP/SHA-256. The result is a single self-describing blob
//! (see [`SealedBlob`]).
//!
//! # Security Properties
//!
//! - **Confidentiality**: only the holder of the matching private key can
//!   unwrap the AES key
//! - **Integrity**: the GCM tag is verified as part of decryption, so any
//!   altered byte makes [`unseal`] fail
//! - **Per-artifact keys**: keys and IVs are never reused, so compromising
//!   one artifact's AES key exposes nothing else
//! - **No oracle**: every opening failure is reported as
//!   [`EvidenceError::DecryptionFailed`]
//!
//! # Example
//!
//! ```
//! use evidence_lib::keys::generate_key_pair;
//! use evidence_lib::seal::{seal, unseal};
//!
//! let pair = generate_key_pair()?;
//! let blob = seal(b"hello world!", pair.public_key())?;
//! assert_eq!(unseal(&blob, pair.private_key())?, b"hello world!");
//! # Ok::<(), evidence_lib::EvidenceError>(())
//! ```

mod blob;

pub use blob::{is_sealed_layout, SealedBlob, HEADER_LEN, IV_LEN, KEY_LENGTH_LEN, TAG_LEN};

use aes_gcm::{
    aead::{consts::U16, Aead, KeyInit},
    aes::Aes256,
    AesGcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::keys::import_public_key;
use crate::{EvidenceError, Result};

/// Size of the AES-256 key in bytes.
pub const SYMMETRIC_KEY_LEN: usize = 32;

/// AES-256-GCM using the full 16-byte IV slot as its nonce.
type BlobCipher = AesGcm<Aes256, U16>;

/// Seal `payload` for the holder of `recipient`'s private key.
///
/// The output is `HEADER_LEN + recipient.size() + payload.len()` bytes.
pub fn seal(payload: &[u8], recipient: &RsaPublicKey) -> Result<Vec<u8>> {
    let mut symmetric_key = Zeroizing::new([0u8; SYMMETRIC_KEY_LEN]);
    OsRng
        .try_fill_bytes(&mut symmetric_key[..])
        .map_err(|e| EvidenceError::crypto_backend(format!("random source unavailable: {e}")))?;

    let mut iv = [0u8; IV_LEN];
    OsRng
        .try_fill_bytes(&mut iv)
        .map_err(|e| EvidenceError::crypto_backend(format!("random source unavailable: {e}")))?;

    let cipher = BlobCipher::new_from_slice(&symmetric_key[..])
        .map_err(|e| EvidenceError::crypto_backend(e.to_string()))?;

    // aes-gcm appends the tag; the blob stores it ahead of the ciphertext.
    let mut ciphertext = cipher
        .encrypt(Nonce::<U16>::from_slice(&iv), payload)
        .map_err(|_| EvidenceError::crypto_backend("AES-GCM encryption failed"))?;
    let tag_bytes = ciphertext.split_off(ciphertext.len() - TAG_LEN);
    let tag: [u8; TAG_LEN] = tag_bytes
        .as_slice()
        .try_into()
        .map_err(|_| EvidenceError::crypto_backend("unexpected AES-GCM tag size"))?;

    let wrapped_key = recipient
        .encrypt(&mut OsRng, Oaep::new::<Sha256>(), &symmetric_key[..])
        .map_err(|e| EvidenceError::crypto_backend(format!("RSA-OAEP key wrap failed: {e}")))?;

    SealedBlob {
        iv,
        tag,
        wrapped_key: &wrapped_key,
        ciphertext: &ciphertext,
    }
    .to_bytes()
}

/// Seal `payload` for a recipient given their exported public key.
///
/// Fails with [`EvidenceError::KeyFormat`] when the key cannot be parsed.
pub fn seal_with_encoded_key(payload: &[u8], recipient: &str) -> Result<Vec<u8>> {
    let recipient = import_public_key(recipient)?;
    seal(payload, &recipient)
}

/// Open a blob produced by [`seal`].
///
/// Wrong key, truncation, a key length pointing past the buffer, and any
/// modified byte all yield [`EvidenceError::DecryptionFailed`].
pub fn unseal(blob: &[u8], recipient: &RsaPrivateKey) -> Result<Vec<u8>> {
    let parsed = SealedBlob::parse(blob).ok_or(EvidenceError::DecryptionFailed)?;

    let symmetric_key = Zeroizing::new(
        recipient
            .decrypt(Oaep::new::<Sha256>(), parsed.wrapped_key)
            .map_err(|_| EvidenceError::DecryptionFailed)?,
    );
    if symmetric_key.len() != SYMMETRIC_KEY_LEN {
        return Err(EvidenceError::DecryptionFailed);
    }

    let cipher = BlobCipher::new_from_slice(symmetric_key.as_slice())
        .map_err(|_| EvidenceError::DecryptionFailed)?;

    let mut sealed = Vec::with_capacity(parsed.ciphertext.len() + TAG_LEN);
    sealed.extend_from_slice(parsed.ciphertext);
    sealed.extend_from_slice(&parsed.tag);

    cipher
        .decrypt(Nonce::<U16>::from_slice(&parsed.iv), sealed.as_slice())
        .map_err(|_| EvidenceError::DecryptionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::export_public_key;
    use crate::test_utils::{other_key_pair, shared_key_pair};

    #[test]
    fn test_hello_world_scenario() {
        let pair = shared_key_pair();
        let payload = b"hello world!";

        let blob = seal(payload, pair.public_key()).unwrap();
        let parsed = SealedBlob::parse(&blob).unwrap();

        assert_eq!(parsed.key_length(), 256);
        assert_eq!(blob.len(), 16 + 16 + 2 + parsed.key_length() + 12);
        assert_eq!(&blob[32..34], &[0x01, 0x00]);
        assert_eq!(unseal(&blob, pair.private_key()).unwrap(), payload);
    }

    #[test]
    fn test_empty_payload() {
        let pair = shared_key_pair();
        let blob = seal(b"", pair.public_key()).unwrap();
        assert_eq!(blob.len(), HEADER_LEN + pair.wrapped_key_len());
        assert!(unseal(&blob, pair.private_key()).unwrap().is_empty());
    }

    #[test]
    fn test_ciphertext_hides_payload() {
        let pair = shared_key_pair();
        let payload = vec![0x41u8; 256];
        let blob = seal(&payload, pair.public_key()).unwrap();
        let parsed = SealedBlob::parse(&blob).unwrap();
        assert_ne!(parsed.ciphertext, payload.as_slice());
    }

    #[test]
    fn test_fresh_iv_and_key_per_seal() {
        let pair = shared_key_pair();
        let a = seal(b"same evidence", pair.public_key()).unwrap();
        let b = seal(b"same evidence", pair.public_key()).unwrap();

        assert_ne!(a, b);
        let (a, b) = (SealedBlob::parse(&a).unwrap(), SealedBlob::parse(&b).unwrap());
        assert_ne!(a.iv, b.iv);
        assert_ne!(a.wrapped_key, b.wrapped_key);
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = seal(b"for alice only", shared_key_pair().public_key()).unwrap();
        let result = unseal(&blob, other_key_pair().private_key());
        assert!(matches!(result, Err(EvidenceError::DecryptionFailed)));
    }

    #[test]
    fn test_truncated_blob_fails() {
        let pair = shared_key_pair();
        let blob = seal(b"truncate me", pair.public_key()).unwrap();

        for len in [0, 10, HEADER_LEN, HEADER_LEN + 100, blob.len() - 1] {
            let result = unseal(&blob[..len], pair.private_key());
            assert!(
                matches!(result, Err(EvidenceError::DecryptionFailed)),
                "truncation to {len} bytes was not rejected"
            );
        }
    }

    #[test]
    fn test_key_length_past_end_fails() {
        let pair = shared_key_pair();
        let mut blob = seal(b"payload", pair.public_key()).unwrap();
        blob[32] = 0xFF;
        assert!(matches!(
            unseal(&blob, pair.private_key()),
            Err(EvidenceError::DecryptionFailed)
        ));
    }

    #[test]
    fn test_tampered_iv_and_wrapped_key_fail() {
        let pair = shared_key_pair();
        let blob = seal(b"payload", pair.public_key()).unwrap();

        for index in [0, IV_LEN - 1, HEADER_LEN, HEADER_LEN + 128] {
            let mut tampered = blob.clone();
            tampered[index] ^= 0x01;
            assert!(matches!(
                unseal(&tampered, pair.private_key()),
                Err(EvidenceError::DecryptionFailed)
            ));
        }
    }

    #[test]
    fn test_seal_with_encoded_key() {
        let pair = shared_key_pair();
        let encoded = export_public_key(pair.public_key()).unwrap();
        let blob = seal_with_encoded_key(b"encoded", &encoded).unwrap();
        assert_eq!(unseal(&blob, pair.private_key()).unwrap(), b"encoded");

        assert!(matches!(
            seal_with_encoded_key(b"encoded", "not-a-valid-key"),
            Err(EvidenceError::KeyFormat(_))
        ));
    }
}
