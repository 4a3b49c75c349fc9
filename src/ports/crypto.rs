// src/ports/crypto.rs
use core::fmt;

use p256::SecretKey;
use rand_core::CryptoRngCore;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::domain::handshake::{EcdhPublicKey, Kyber768PublicKey};

/// AES-256 key size.
pub const AEAD_KEY_LEN: usize = 32;
/// Length of the random IV prefixed to every AEAD blob.
pub const AEAD_IV_LEN: usize = 12;
/// Length of the authentication tag in bytes.
pub const AEAD_TAG_LEN: usize = 16;
/// Bytes an AEAD blob adds on top of its plaintext.
pub const AEAD_OVERHEAD: usize = AEAD_IV_LEN + AEAD_TAG_LEN;
/// Length of one ECDH or Kyber768 shared secret.
pub const SHARED_SECRET_LEN: usize = 32;

#[derive(Clone, Zeroize, ZeroizeOnDrop, PartialEq, Eq)]
pub struct AeadKey(pub [u8; AEAD_KEY_LEN]); // AES-256-GCM key

impl fmt::Debug for AeadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AeadKey(..)")
    }
}

/// A pair of direction-scoped keys (K1 or one half of K2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SymmetricKeys {
    pub client_to_server: AeadKey,
    pub server_to_client: AeadKey,
}

/// One 32-byte shared secret out of ECDH or Kyber768.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret(pub [u8; SHARED_SECRET_LEN]);

impl SharedSecret {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_LEN] {
        &self.0
    }
}

impl fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SharedSecret(..)")
    }
}

/// Both secrets produced by one hybrid encapsulation or decapsulation.
///
/// ```compile_fail
/// fn duplicate<T: Clone>(_: &T) {}
/// fn check(keys: &tee3_handshake::ports::crypto::SharedKeys) {
///     duplicate(keys);
/// }
/// ```
#[derive(Debug)]
pub struct SharedKeys {
    pub ecdh: SharedSecret,
    pub kyber768: SharedSecret,
}

/// Kyber768 decapsulation key (2400 bytes).
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Kyber768PrivateKey(pub(crate) Vec<u8>);

impl Kyber768PrivateKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Kyber768PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kyber768PrivateKey(..)")
    }
}

/// Public halves of a hybrid key pair set, as they go on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKeys {
    pub ecdh: EcdhPublicKey,
    pub kyber768: Kyber768PublicKey,
}

/// Private halves of a hybrid key pair set. `SecretKey` wipes itself on drop.
///
/// ```compile_fail
/// fn duplicate<T: Clone>(_: &T) {}
/// fn check(keys: &tee3_handshake::ports::crypto::PrivateKeys) {
///     duplicate(keys);
/// }
/// ```
#[derive(Debug)]
pub struct PrivateKeys {
    pub ecdh: SecretKey,
    pub kyber768: Kyber768PrivateKey,
}

/// A P-256 key pair plus a Kyber768 key pair.
#[derive(Debug)]
pub struct KeyPairs {
    pub public: PublicKeys,
    pub private: PrivateKeys,
}

/// Authenticated encryption used for every handshake blob.
///
/// Blobs are self-contained: `IV || ciphertext || tag`. The IV is drawn from
/// the caller's RNG on every seal, so a key may protect several blobs.
///
/// Implementations must not reveal why `open` failed beyond the returned
/// variant, and callers collapse every variant into one protocol error.
pub trait HandshakeAead {
    /// Encrypt a non-empty `plaintext` under `key`.
    /// # Errors
    /// Returns `AeadError::EmptyPlaintext` for empty input or
    /// `AeadError::Internal` if encryption fails.
    fn seal<R: CryptoRngCore>(
        &self,
        key: &AeadKey,
        plaintext: &[u8],
        rng: &mut R,
    ) -> Result<Vec<u8>, AeadError>;

    /// Verify and decrypt a blob produced by `seal`.
    /// # Errors
    /// Returns `AeadError::Truncated` if the blob cannot hold IV and tag, or
    /// `AeadError::TagMismatch` if authentication fails.
    fn open(&self, key: &AeadKey, blob: &[u8]) -> Result<Vec<u8>, AeadError>;
}

#[derive(Debug, thiserror::Error)]
pub enum AeadError {
    #[error("plaintext must not be empty")]
    EmptyPlaintext,
    #[error("ciphertext too short")]
    Truncated,
    #[error("decryption failed (tag mismatch)")]
    TagMismatch,
    #[error("internal crypto error")]
    Internal,
}
