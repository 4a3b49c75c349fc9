/*
    Kyber768 KEM (round-3 Kyber, as used by the gematik VAU protocol).

    Backed by `libcrux-ml-kem` with the `kyber` feature. All randomness comes
    from the caller's RNG so a seeded RNG gives reproducible output.

    Every value that crosses the network has a fixed length; a mismatch is an
    error, never a truncation or a pad.
*/

use libcrux_ml_kem::kyber768;
use libcrux_ml_kem::mlkem768::{
    self, MlKem768Ciphertext, MlKem768PrivateKey, MlKem768PublicKey,
};
use rand_core::CryptoRngCore;
use zeroize::Zeroizing;

use crate::domain::handshake::params::{
    KYBER768_CIPHERTEXT_LEN, KYBER768_PRIVATE_KEY_LEN, KYBER768_PUBLIC_KEY_LEN,
};
use crate::domain::handshake::{Kyber768CipherText, Kyber768PublicKey};
use crate::ports::crypto::{Kyber768PrivateKey, SharedSecret};

const KEY_GEN_SEED_LEN: usize = 64;
const ENCAPS_SEED_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KemError {
    #[error("Kyber768 {what} must be {expected} bytes, got {actual}")]
    InvalidLength {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("Kyber768 public key failed the consistency check")]
    InvalidPublicKey,
}

fn fixed<const N: usize>(what: &'static str, bytes: &[u8]) -> Result<[u8; N], KemError> {
    <[u8; N]>::try_from(bytes).map_err(|_| KemError::InvalidLength {
        what,
        expected: N,
        actual: bytes.len(),
    })
}

impl Kyber768PrivateKey {
    /// Wrap a serialized decapsulation key.
    ///
    /// # Errors
    /// Returns `KemError::InvalidLength` unless `bytes` is 2400 bytes long.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KemError> {
        if bytes.len() != KYBER768_PRIVATE_KEY_LEN {
            return Err(KemError::InvalidLength {
                what: "private key",
                expected: KYBER768_PRIVATE_KEY_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes.to_vec()))
    }
}

/// Generate a key pair.
pub fn create_key_pair<R: CryptoRngCore>(
    rng: &mut R,
) -> (Kyber768PublicKey, Kyber768PrivateKey) {
    let mut seed = Zeroizing::new([0u8; KEY_GEN_SEED_LEN]);
    rng.fill_bytes(seed.as_mut());
    let pair = kyber768::generate_key_pair(*seed);
    (
        Kyber768PublicKey(pair.pk().to_vec()),
        Kyber768PrivateKey(pair.sk().to_vec()),
    )
}

/// Length check followed by the library's modulus check on the encoded key.
#[must_use]
pub fn is_valid_public_key(public_key: &Kyber768PublicKey) -> bool {
    match fixed::<KYBER768_PUBLIC_KEY_LEN>("public key", public_key.as_bytes()) {
        Ok(raw) => mlkem768::validate_public_key(&MlKem768PublicKey::from(raw)),
        Err(_) => false,
    }
}

/// Encapsulate a fresh shared secret to `public_key`.
///
/// # Errors
/// Returns `KemError::InvalidLength` or `KemError::InvalidPublicKey` when the
/// key does not pass [`is_valid_public_key`].
pub fn encapsulate<R: CryptoRngCore>(
    public_key: &Kyber768PublicKey,
    rng: &mut R,
) -> Result<(SharedSecret, Kyber768CipherText), KemError> {
    let raw = fixed::<KYBER768_PUBLIC_KEY_LEN>("public key", public_key.as_bytes())?;
    let public_key = MlKem768PublicKey::from(raw);
    if !mlkem768::validate_public_key(&public_key) {
        return Err(KemError::InvalidPublicKey);
    }
    let mut randomness = Zeroizing::new([0u8; ENCAPS_SEED_LEN]);
    rng.fill_bytes(randomness.as_mut());
    let (cipher_text, shared) = kyber768::encapsulate(&public_key, *randomness);
    Ok((
        SharedSecret(shared),
        Kyber768CipherText(cipher_text.as_ref().to_vec()),
    ))
}

/// Recover the shared secret for `cipher_text`. Deterministic; a forged
/// ciphertext yields an unrelated secret (implicit rejection), not an error.
///
/// # Errors
/// Returns `KemError::InvalidLength` for a wrongly sized key or ciphertext.
pub fn decapsulate(
    private_key: &Kyber768PrivateKey,
    cipher_text: &Kyber768CipherText,
) -> Result<SharedSecret, KemError> {
    let sk = Zeroizing::new(fixed::<KYBER768_PRIVATE_KEY_LEN>(
        "private key",
        private_key.as_bytes(),
    )?);
    let ct = fixed::<KYBER768_CIPHERTEXT_LEN>("ciphertext", cipher_text.as_bytes())?;
    let shared = kyber768::decapsulate(
        &MlKem768PrivateKey::from(*sk),
        &MlKem768Ciphertext::from(ct),
    );
    Ok(SharedSecret(shared))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand_chacha::ChaCha20Rng;
    use rand_core::SeedableRng;

    #[test]
    fn key_pair_sizes() {
        let mut rng = ChaCha20Rng::seed_from_u64(7);
        let (pk, sk) = create_key_pair(&mut rng);
        assert_eq!(pk.as_bytes().len(), KYBER768_PUBLIC_KEY_LEN);
        assert_eq!(sk.as_bytes().len(), KYBER768_PRIVATE_KEY_LEN);
        assert!(is_valid_public_key(&pk));
    }

    #[test]
    fn encapsulate_decapsulate_agree() {
        let mut rng = ChaCha20Rng::seed_from_u64(8);
        let (pk, sk) = create_key_pair(&mut rng);
        let (ss, ct) = encapsulate(&pk, &mut rng).unwrap();
        assert_eq!(ct.as_bytes().len(), KYBER768_CIPHERTEXT_LEN);
        let back = decapsulate(&sk, &ct).unwrap();
        assert_eq!(ss.as_bytes(), back.as_bytes());
    }

    #[test]
    fn seeded_generation_is_reproducible() {
        let (pk1, _) = create_key_pair(&mut ChaCha20Rng::seed_from_u64(9));
        let (pk2, _) = create_key_pair(&mut ChaCha20Rng::seed_from_u64(9));
        assert_eq!(pk1, pk2);
    }

    #[test]
    fn tampered_ciphertext_gives_other_secret() {
        let mut rng = ChaCha20Rng::seed_from_u64(10);
        let (pk, sk) = create_key_pair(&mut rng);
        let (ss, mut ct) = encapsulate(&pk, &mut rng).unwrap();
        ct.0[0] ^= 0x01;
        let back = decapsulate(&sk, &ct).unwrap();
        assert_ne!(ss.as_bytes(), back.as_bytes());
    }

    #[test]
    fn wrong_lengths_are_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(11);
        let short = Kyber768PublicKey(vec![0u8; KYBER768_PUBLIC_KEY_LEN - 1]);
        assert!(!is_valid_public_key(&short));
        assert!(matches!(
            encapsulate(&short, &mut rng),
            Err(KemError::InvalidLength { actual: 1183, .. })
        ));

        let (_, sk) = create_key_pair(&mut rng);
        let ct = Kyber768CipherText(vec![0u8; 10]);
        assert!(matches!(
            decapsulate(&sk, &ct),
            Err(KemError::InvalidLength { what: "ciphertext", .. })
        ));
        assert!(Kyber768PrivateKey::from_bytes(&[0u8; 12]).is_err());
    }

    #[test]
    fn out_of_range_coefficients_fail_validation() {
        // 0xFF bytes decode to 12-bit coefficients of 4095 >= q.
        let pk = Kyber768PublicKey(vec![0xFF; KYBER768_PUBLIC_KEY_LEN]);
        assert!(!is_valid_public_key(&pk));
        let mut rng = ChaCha20Rng::seed_from_u64(12);
        assert_eq!(
            encapsulate(&pk, &mut rng).unwrap_err(),
            KemError::InvalidPublicKey
        );
    }
}
