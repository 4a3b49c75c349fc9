/*
    HKDF-SHA-256 helpers for the TEE3 key schedule.

    - RFC5869: https://datatracker.ietf.org/doc/html/rfc5869
    - SHA-256: https://datatracker.ietf.org/doc/html/rfc6234

    Provides:
    - Raw `hkdf_extract` / `hkdf_expand` helpers
    - One-shot `hkdf` with no salt and no info, the only form the
      handshake uses (K1 and K2 derivation)

    Note: `hkdf` crate uses `sha2` for hash implementations.
*/

use hkdf::Hkdf;
use sha2::Sha256;
use zeroize::Zeroizing;

/// SHA-256 output length, also the PRK length.
pub const HASH_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
pub enum HkdfError {
    #[error("invalid PRK")]
    InvalidPrk,
    #[error("invalid length")]
    InvalidLength,
}

/// `HKDF-SHA-256` extract (RFC5869 §2.2).
///
/// An empty `salt` is treated as `HashLen` zero bytes, as the RFC prescribes.
#[must_use]
pub fn hkdf_extract(salt: &[u8], ikm: &[u8]) -> Zeroizing<[u8; HASH_LEN]> {
    let salt = (!salt.is_empty()).then_some(salt);
    let (prk, _) = Hkdf::<Sha256>::extract(salt, ikm);
    let mut out = Zeroizing::new([0u8; HASH_LEN]);
    out.copy_from_slice(&prk);
    out
}

/// `HKDF-SHA-256` expand (RFC5869 §2.3) into `out`.
///
/// Max output length is 255 * `HashLen` = 8160 bytes.
///
/// # Errors
/// Returns `HkdfError::InvalidPrk` if `prk` is shorter than `HashLen`
/// or `HkdfError::InvalidLength` if `out` is too long.
pub fn hkdf_expand(info: &[u8], prk: &[u8], out: &mut [u8]) -> Result<(), HkdfError> {
    let hk = Hkdf::<Sha256>::from_prk(prk).map_err(|_| HkdfError::InvalidPrk)?;
    hk.expand(info, out).map_err(|_| HkdfError::InvalidLength)
}

/// Extract-then-expand with no salt and no info.
///
/// # Errors
/// Returns `HkdfError::InvalidLength` if `out` exceeds the HKDF limit.
pub fn hkdf(ikm: &[u8], out: &mut [u8]) -> Result<(), HkdfError> {
    Hkdf::<Sha256>::new(None, ikm)
        .expand(&[], out)
        .map_err(|_| HkdfError::InvalidLength)
}
