// src/adapters/crypto/aes256gcm.rs
use aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand_core::CryptoRngCore;

use crate::ports::crypto::{
    AEAD_IV_LEN, AEAD_OVERHEAD, AEAD_TAG_LEN, AeadError, AeadKey, HandshakeAead,
};

/// AES-256-GCM with a random 96-bit IV per blob and no associated data.
///
/// Blob layout: `IV (12) || ciphertext || tag (16)`, so a blob is always
/// 28 bytes longer than its plaintext.
///
/// Error mapping:
/// - `seal` rejects empty plaintext with `AeadError::EmptyPlaintext` and maps
///   any cipher failure to `AeadError::Internal`.
/// - `open` reports `AeadError::Truncated` when the blob cannot hold IV and
///   tag, and `AeadError::TagMismatch` for every authentication failure.
#[derive(Debug, Clone, Copy, Default)]
pub struct AesGcmAead;

impl HandshakeAead for AesGcmAead {
    fn seal<R: CryptoRngCore>(
        &self,
        key: &AeadKey,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, AeadError> {
        if plaintext.is_empty() {
            return Err(AeadError::EmptyPlaintext);
        }
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        let mut iv = [0u8; AEAD_IV_LEN];
        rng.fill_bytes(&mut iv);
        let sealed = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext)
            .map_err(|_| AeadError::Internal)?;
        let mut out = Vec::with_capacity(plaintext.len() + AEAD_OVERHEAD);
        out.extend_from_slice(&iv);
        out.extend_from_slice(&sealed);
        Ok(out)
    }

    fn open(&self, key: &AeadKey, blob: &[u8]) -> Result<Vec<u8>, AeadError> {
        if blob.len() < AEAD_IV_LEN + AEAD_TAG_LEN {
            return Err(AeadError::Truncated);
        }
        let (iv, sealed) = blob.split_at(AEAD_IV_LEN);
        let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key.0));
        cipher
            .decrypt(Nonce::from_slice(iv), sealed)
            .map_err(|_| AeadError::TagMismatch)
    }
}
