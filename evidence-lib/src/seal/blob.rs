//! Sealed blob framing.
//!
//! ```text
//! [16 bytes IV][16 bytes auth tag][2 bytes key length, BE][N bytes wrapped key][ciphertext]
//! ```

use crate::{EvidenceError, Result};

/// Size of the symmetric-cipher IV slot.
pub const IV_LEN: usize = 16;

/// Size of the authentication tag.
pub const TAG_LEN: usize = 16;

/// Size of the big-endian wrapped key length field.
pub const KEY_LENGTH_LEN: usize = 2;

/// Fixed-size prefix preceding the wrapped key.
pub const HEADER_LEN: usize = IV_LEN + TAG_LEN + KEY_LENGTH_LEN;

/// Borrowed view over the fields of a sealed blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealedBlob<'a> {
    /// Initialization vector, fresh per seal.
    pub iv: [u8; IV_LEN],
    /// AES-GCM authentication tag over the ciphertext.
    pub tag: [u8; TAG_LEN],
    /// Symmetric key encrypted under the recipient's public key.
    pub wrapped_key: &'a [u8],
    /// Payload encrypted under the symmetric key.
    pub ciphertext: &'a [u8],
}

impl<'a> SealedBlob<'a> {
    /// Split raw bytes into their fields.
    ///
    /// Returns `None` when the buffer is shorter than the fixed header or the
    /// key length points past the end of the buffer.
    pub fn parse(bytes: &'a [u8]) -> Option<Self> {
        if bytes.len() < HEADER_LEN {
            return None;
        }

        let (iv, rest) = bytes.split_at(IV_LEN);
        let (tag, rest) = rest.split_at(TAG_LEN);
        let (key_len, rest) = rest.split_at(KEY_LENGTH_LEN);
        let key_len = u16::from_be_bytes([key_len[0], key_len[1]]) as usize;

        if rest.len() < key_len {
            return None;
        }
        let (wrapped_key, ciphertext) = rest.split_at(key_len);

        Some(Self {
            iv: iv.try_into().ok()?,
            tag: tag.try_into().ok()?,
            wrapped_key,
            ciphertext,
        })
    }

    /// Value of the key length field.
    pub fn key_length(&self) -> usize {
        self.wrapped_key.len()
    }

    /// Total encoded size.
    pub fn encoded_len(&self) -> usize {
        HEADER_LEN + self.wrapped_key.len() + self.ciphertext.len()
    }

    /// Encode the fields in wire order.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let key_len = u16::try_from(self.wrapped_key.len()).map_err(|_| {
            EvidenceError::crypto_backend(format!(
                "wrapped key of {} bytes does not fit the length field",
                self.wrapped_key.len()
            ))
        })?;

        let mut out = Vec::with_capacity(self.encoded_len());
        out.extend_from_slice(&self.iv);
        out.extend_from_slice(&self.tag);
        out.extend_from_slice(&key_len.to_be_bytes());
        out.extend_from_slice(self.wrapped_key);
        out.extend_from_slice(self.ciphertext);
        Ok(out)
    }
}

/// Check whether bytes are framed like a sealed blob.
///
/// This is a structural check only and says nothing about whether the blob
/// can be opened.
pub fn is_sealed_layout(bytes: &[u8]) -> bool {
    SealedBlob::parse(bytes).is_some_and(|blob| !blob.wrapped_key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        let wrapped = [0xAAu8; 5];
        let ciphertext = [0xBBu8; 3];
        SealedBlob {
            iv: [1u8; IV_LEN],
            tag: [2u8; TAG_LEN],
            wrapped_key: &wrapped,
            ciphertext: &ciphertext,
        }
        .to_bytes()
        .unwrap()
    }

    #[test]
    fn test_field_order_and_endianness() {
        let bytes = sample();
        assert_eq!(bytes.len(), HEADER_LEN + 5 + 3);
        assert_eq!(&bytes[..16], &[1u8; 16]);
        assert_eq!(&bytes[16..32], &[2u8; 16]);
        assert_eq!(&bytes[32..34], &[0x00, 0x05]);
        assert_eq!(&bytes[34..39], &[0xAA; 5]);
        assert_eq!(&bytes[39..], &[0xBB; 3]);
    }

    #[test]
    fn test_parse_splits_fields() {
        let bytes = sample();
        let blob = SealedBlob::parse(&bytes).unwrap();
        assert_eq!(blob.iv, [1u8; IV_LEN]);
        assert_eq!(blob.tag, [2u8; TAG_LEN]);
        assert_eq!(blob.key_length(), 5);
        assert_eq!(blob.ciphertext, &[0xBB; 3]);
        assert_eq!(blob.encoded_len(), bytes.len());
    }

    #[test]
    fn test_parse_accepts_empty_ciphertext() {
        let mut bytes = sample();
        bytes.truncate(HEADER_LEN + 5);
        let blob = SealedBlob::parse(&bytes).unwrap();
        assert!(blob.ciphertext.is_empty());
    }

    #[test]
    fn test_parse_rejects_short_header() {
        assert!(SealedBlob::parse(&[0u8; HEADER_LEN - 1]).is_none());
        assert!(SealedBlob::parse(&[]).is_none());
    }

    #[test]
    fn test_parse_rejects_key_length_past_end() {
        let mut bytes = sample();
        bytes[32] = 0xFF;
        bytes[33] = 0xFF;
        assert!(SealedBlob::parse(&bytes).is_none());
        assert!(!is_sealed_layout(&bytes));
    }

    #[test]
    fn test_oversized_wrapped_key_rejected() {
        let wrapped = vec![0u8; u16::MAX as usize + 1];
        let blob = SealedBlob {
            iv: [0u8; IV_LEN],
            tag: [0u8; TAG_LEN],
            wrapped_key: &wrapped,
            ciphertext: &[],
        };
        assert!(matches!(
            blob.to_bytes(),
            Err(EvidenceError::CryptoBackend(_))
        ));
    }

    #[test]
    fn test_is_sealed_layout() {
        assert!(is_sealed_layout(&sample()));
        assert!(!is_sealed_layout(b"plain text evidence"));
        assert!(!is_sealed_layout(&[0u8; HEADER_LEN]));
    }
}
