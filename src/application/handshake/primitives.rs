//! Crypto steps shared by both handshake round trips.
//!
//! Every function here speaks `TeeError`: lower-level errors are logged and
//! folded into the protocol kind the peer is allowed to see.

use rand_core::CryptoRngCore;
use tracing::{error, warn};

use crate::core::crypto::kyber768::KemError;
use crate::core::crypto::{ecdh, kyber768};
use crate::domain::handshake::{CipherTexts, EcdhPublicKey, Kyber768PublicKey, TeeError};
use crate::ports::crypto::{AeadKey, HandshakeAead, PrivateKeys, SharedKeys};

/// Result of encapsulating to a peer: the secrets stay here, the
/// ciphertexts go on the wire. Never split.
#[derive(Debug)]
pub struct Encapsulation {
    pub shared_keys: SharedKeys,
    pub cipher_texts: CipherTexts,
}

/// All-or-nothing check of a peer's hybrid public keys: curve name,
/// coordinate lengths, curve membership and the Kyber768 key check.
///
/// # Errors
/// `TeeError::FailedPublicKeyVerification` on any failed check.
pub fn verify_vau_keys(
    ecdh_public_key: &EcdhPublicKey,
    kyber768_public_key: &Kyber768PublicKey,
) -> Result<(), TeeError> {
    if let Err(e) = ecdh::public_key_from_wire(ecdh_public_key) {
        warn!("peer ECDH key rejected: {e}");
        return Err(TeeError::FailedPublicKeyVerification);
    }
    if !kyber768::is_valid_public_key(kyber768_public_key) {
        warn!(
            len = kyber768_public_key.as_bytes().len(),
            "peer Kyber768 key rejected"
        );
        return Err(TeeError::FailedPublicKeyVerification);
    }
    Ok(())
}

/// Encapsulate to a peer's hybrid public keys. The ephemeral ECDH scalar
/// does not outlive this call.
///
/// # Errors
/// `TeeError::FailedPublicKeyVerification` if either key is unusable.
pub fn encapsulate<R: CryptoRngCore>(
    ecdh_public_key: &EcdhPublicKey,
    kyber768_public_key: &Kyber768PublicKey,
    rng: &mut R,
) -> Result<Encapsulation, TeeError> {
    let peer = ecdh::public_key_from_wire(ecdh_public_key).map_err(|e| {
        warn!("ECDH encapsulation refused: {e}");
        TeeError::FailedPublicKeyVerification
    })?;
    let (ecdh_secret, ecdh_cipher_text) = ecdh::ephemeral_agree(&peer, rng);
    let (kyber_secret, kyber_cipher_text) = kyber768::encapsulate(kyber768_public_key, rng)
        .map_err(|e| {
            warn!("Kyber768 encapsulation refused: {e}");
            TeeError::FailedPublicKeyVerification
        })?;
    Ok(Encapsulation {
        shared_keys: SharedKeys {
            ecdh: ecdh_secret,
            kyber768: kyber_secret,
        },
        cipher_texts: CipherTexts {
            ecdh: ecdh_cipher_text,
            kyber768: kyber_cipher_text,
        },
    })
}

/// Recover the secrets a peer encapsulated to `private_keys`.
///
/// # Errors
/// * `TeeError::FailedPublicKeyVerification` if the ECDH ciphertext is not a
///   valid P-256 point.
/// * `TeeError::DecodingError` for a wrongly sized Kyber768 ciphertext.
/// * `TeeError::InternalServerError` if the private key itself is unusable.
pub fn decapsulate(
    cipher_texts: &CipherTexts,
    private_keys: &PrivateKeys,
) -> Result<SharedKeys, TeeError> {
    let peer = ecdh::public_key_from_wire(&cipher_texts.ecdh).map_err(|e| {
        warn!("ECDH ciphertext rejected: {e}");
        TeeError::FailedPublicKeyVerification
    })?;
    let ecdh_secret = ecdh::static_agree(&private_keys.ecdh, &peer);
    let kyber_secret = kyber768::decapsulate(&private_keys.kyber768, &cipher_texts.kyber768)
        .map_err(|e| match e {
            KemError::InvalidLength {
                what: "ciphertext", ..
            } => {
                warn!("Kyber768 ciphertext rejected: {e}");
                TeeError::DecodingError(e.to_string())
            }
            other => {
                error!("Kyber768 decapsulation failed: {other}");
                TeeError::InternalServerError("Kyber768 decapsulation failed".into())
            }
        })?;
    Ok(SharedKeys {
        ecdh: ecdh_secret,
        kyber768: kyber_secret,
    })
}

/// Seal `plaintext` under `key` with a fresh IV.
///
/// # Errors
/// `TeeError::InternalServerError`; sealing only fails on misuse.
pub fn aead_encrypt<A: HandshakeAead, R: CryptoRngCore>(
    aead: &A,
    key: &AeadKey,
    plaintext: &[u8],
    rng: &mut R,
) -> Result<Vec<u8>, TeeError> {
    aead.seal(key, plaintext, rng).map_err(|e| {
        error!("AEAD encryption failed: {e}");
        TeeError::InternalServerError("AEAD encryption failed".into())
    })
}

/// Open a blob. Every failure looks the same to the caller: only
/// `description` survives.
///
/// # Errors
/// `TeeError::GcmDecryptionFailure(description)`.
pub fn aead_decrypt<A: HandshakeAead>(
    aead: &A,
    key: &AeadKey,
    blob: &[u8],
    description: &str,
) -> Result<Vec<u8>, TeeError> {
    aead.open(key, blob).map_err(|_| {
        warn!(what = description, "AEAD decryption failed");
        TeeError::GcmDecryptionFailure(description.to_owned())
    })
}
