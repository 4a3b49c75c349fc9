use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};

use super::TEST_CERTIFICATE;
use crate::core::cbor::to_cbor;
use crate::core::crypto::generate_key_pairs;
use crate::domain::handshake::{SignedPublicKeys, TeeError, VauKeys};
use crate::ports::crypto::{KeyPairs, PrivateKeys, PublicKeys};
use crate::ports::server_keys::ServerKeys;

/// `exp - iat` of the bundle built by [`FixedServerKeys::generate`].
pub const FIXED_KEYS_LIFETIME_SECS: i64 = 8 * 24 * 60 * 60;

/// `ServerKeys` that never looks at a clock.
///
/// `iat` comes from the caller and no age limit is enforced, so the same RNG
/// seed gives byte-identical bundles whenever it runs.
pub struct FixedServerKeys {
    signer: SigningKey,
    public: PublicKeys,
    private: PrivateKeys,
    signed: SignedPublicKeys,
}

impl FixedServerKeys {
    /// Draws the ES256 identity, then the key pairs, from `rng`.
    ///
    /// # Errors
    /// Propagates bundle encoding failures.
    pub fn generate<R: CryptoRngCore>(rng: &mut R, iat: i64) -> Result<Self, TeeError> {
        let signer = SigningKey::random(rng);
        let KeyPairs { public, private } = generate_key_pairs(rng);
        let vau_keys = VauKeys {
            ecdh_public_key: public.ecdh.clone(),
            kyber768_public_key: public.kyber768.clone(),
            iat,
            exp: iat.saturating_add(FIXED_KEYS_LIFETIME_SECS),
            comment: "fixed test keys".to_owned(),
        };
        let signed_pub_keys =
            to_cbor(&vau_keys).map_err(|e| TeeError::InternalServerError(e.to_string()))?;
        let signature: Signature = signer.sign(&signed_pub_keys);
        let signed = SignedPublicKeys {
            signed_pub_keys,
            signature_es256: signature.to_bytes().to_vec(),
            cert_hash: Sha256::digest(TEST_CERTIFICATE).to_vec(),
            cdv: 1,
            ocsp_response: Vec::new(),
        };
        Ok(Self {
            signer,
            public,
            private,
            signed,
        })
    }

    #[must_use]
    pub fn signer(&self) -> &SigningKey {
        &self.signer
    }

    #[must_use]
    pub fn public_keys(&self) -> &PublicKeys {
        &self.public
    }
}

impl ServerKeys for FixedServerKeys {
    fn signed_public_keys(&self) -> Result<SignedPublicKeys, TeeError> {
        Ok(self.signed.clone())
    }

    fn private_keys(&self) -> Result<&PrivateKeys, TeeError> {
        Ok(&self.private)
    }
}
