/*
    P-256 Diffie-Hellman for the classical half of the hybrid KEM.

    The ECDH "ciphertext" is simply the sender's ephemeral public key, so
    encapsulation is: fresh key pair, DH against the peer, drop the private
    scalar. Peer keys arrive as raw affine coordinates and are only turned
    into a `p256::PublicKey` after the curve check.
*/

use p256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use p256::pkcs8::DecodePrivateKey;
use p256::{EncodedPoint, FieldBytes, PublicKey, SecretKey, ecdh};
use rand_core::CryptoRngCore;

use crate::domain::handshake::EcdhPublicKey;
use crate::domain::handshake::params::{ECDH_COORDINATE_LEN, ECDH_CURVE};
use crate::ports::crypto::{SHARED_SECRET_LEN, SharedSecret};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EcdhError {
    #[error("unsupported curve {0:?}")]
    UnsupportedCurve(String),
    #[error("coordinate must be {ECDH_COORDINATE_LEN} bytes")]
    InvalidCoordinateLength,
    #[error("point is not on P-256")]
    NotOnCurve,
    #[error("unreadable private key")]
    InvalidPrivateKey,
}

/// Validate a wire key and turn it into a curve point.
///
/// # Errors
/// Returns the first check that fails: curve name, coordinate length, or
/// curve membership (which also rejects the point at infinity).
pub fn public_key_from_wire(key: &EcdhPublicKey) -> Result<PublicKey, EcdhError> {
    if key.curve != ECDH_CURVE {
        return Err(EcdhError::UnsupportedCurve(key.curve.clone()));
    }
    if key.x.len() != ECDH_COORDINATE_LEN || key.y.len() != ECDH_COORDINATE_LEN {
        return Err(EcdhError::InvalidCoordinateLength);
    }
    let point = EncodedPoint::from_affine_coordinates(
        FieldBytes::from_slice(&key.x),
        FieldBytes::from_slice(&key.y),
        false,
    );
    Option::<PublicKey>::from(PublicKey::from_encoded_point(&point)).ok_or(EcdhError::NotOnCurve)
}

/// Wire form of a curve point.
#[must_use]
pub fn public_key_to_wire(key: &PublicKey) -> EcdhPublicKey {
    // Uncompressed SEC1: 0x04 || X || Y
    let point = key.to_encoded_point(false);
    let bytes = point.as_bytes();
    let (x, y) = bytes[1..].split_at(ECDH_COORDINATE_LEN);
    EcdhPublicKey {
        curve: ECDH_CURVE.to_owned(),
        x: x.to_vec(),
        y: y.to_vec(),
    }
}

pub fn generate_key_pair<R: CryptoRngCore>(rng: &mut R) -> (EcdhPublicKey, SecretKey) {
    let secret = SecretKey::random(rng);
    (public_key_to_wire(&secret.public_key()), secret)
}

fn to_shared(shared: &ecdh::SharedSecret) -> SharedSecret {
    let mut out = [0u8; SHARED_SECRET_LEN];
    out.copy_from_slice(shared.raw_secret_bytes());
    SharedSecret(out)
}

/// One-shot DH with a fresh ephemeral key. Returns the shared secret and the
/// ephemeral public key; the private scalar is wiped before returning.
pub fn ephemeral_agree<R: CryptoRngCore>(
    peer: &PublicKey,
    rng: &mut R,
) -> (SharedSecret, EcdhPublicKey) {
    let ephemeral = ecdh::EphemeralSecret::random(rng);
    let shared = ephemeral.diffie_hellman(peer);
    (to_shared(&shared), public_key_to_wire(&ephemeral.public_key()))
}

/// DH with a long-lived (or previously generated) private key.
#[must_use]
pub fn static_agree(secret: &SecretKey, peer: &PublicKey) -> SharedSecret {
    let shared = ecdh::diffie_hellman(secret.to_nonzero_scalar(), peer.as_affine());
    to_shared(&shared)
}

/// Load a P-256 private key from PEM (SEC1 or PKCS#8), SEC1 DER, or a raw
/// 32-byte scalar.
///
/// # Errors
/// Returns `EcdhError::InvalidPrivateKey` if no format matches.
pub fn secret_key_from_encoded(encoded: &[u8]) -> Result<SecretKey, EcdhError> {
    if encoded.starts_with(b"-----BEGIN") {
        let pem = core::str::from_utf8(encoded).map_err(|_| EcdhError::InvalidPrivateKey)?;
        return SecretKey::from_sec1_pem(pem)
            .or_else(|_| SecretKey::from_pkcs8_pem(pem))
            .map_err(|_| EcdhError::InvalidPrivateKey);
    }
    if encoded.len() == SHARED_SECRET_LEN {
        return SecretKey::from_slice(encoded).map_err(|_| EcdhError::InvalidPrivateKey);
    }
    SecretKey::from_sec1_der(encoded)
        .or_else(|_| SecretKey::from_pkcs8_der(encoded))
        .map_err(|_| EcdhError::InvalidPrivateKey)
}
