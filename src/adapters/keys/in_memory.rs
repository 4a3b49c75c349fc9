//! In-process `ServerKeys` implementation.
//!
//! Holds one P-256 + Kyber768 key pair set and the ES256-signed bundle of its
//! public halves. The bundle carries `iat`/`exp` for the client to judge;
//! the server itself only enforces `max_key_age`, after which neither the
//! bundle nor the private halves are handed out.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use p256::ecdsa::signature::Signer;
use p256::ecdsa::{Signature, SigningKey};
use rand_core::CryptoRngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, error};

use crate::core::cbor::to_cbor;
use crate::core::crypto::generate_key_pairs;
use crate::domain::handshake::{SignedPublicKeys, TeeError, VauKeys};
use crate::ports::crypto::{KeyPairs, PrivateKeys, PublicKeys};
use crate::ports::server_keys::ServerKeys;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// Lifetimes and metadata for [`InMemoryServerKeys`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerKeysConfig {
    /// Validity of the signed bundle (`exp - iat`).
    pub signed_keys_lifetime: Duration,
    /// Age after which the private keys are refused.
    pub max_key_age: Duration,
    /// Free text placed in `VauKeys::comment`.
    pub comment: String,
    /// Certificate data version placed in the signed bundle.
    pub cdv: u64,
}

impl Default for ServerKeysConfig {
    fn default() -> Self {
        Self {
            signed_keys_lifetime: 8 * DAY,
            max_key_age: 30 * DAY,
            comment: format!("created by tee3-handshake {}", env!("CARGO_PKG_VERSION")),
            cdv: 1,
        }
    }
}

#[derive(Debug)]
pub struct InMemoryServerKeys {
    key_pairs: KeyPairs,
    vau_keys: VauKeys,
    signed: SignedPublicKeys,
    created_at: SystemTime,
    config: ServerKeysConfig,
}

fn unix_seconds(t: SystemTime) -> Result<i64, TeeError> {
    let secs = t
        .duration_since(UNIX_EPOCH)
        .map_err(|_| TeeError::InternalServerError("key timestamp before epoch".into()))?
        .as_secs();
    i64::try_from(secs).map_err(|_| TeeError::InternalServerError("key timestamp overflow".into()))
}

impl InMemoryServerKeys {
    /// Generate fresh key pairs and sign their public halves.
    ///
    /// # Errors
    /// Returns `TeeError::InternalServerError` if the bundle cannot be built.
    pub fn generate<R: CryptoRngCore>(
        signer: &SigningKey,
        certificate_der: &[u8],
        config: ServerKeysConfig,
        rng: &mut R,
    ) -> Result<Self, TeeError> {
        Self::from_key_pairs(
            generate_key_pairs(rng),
            signer,
            certificate_der,
            config,
            SystemTime::now(),
        )
    }

    /// Wrap existing key pairs (for example loaded from an HSM blob) created
    /// at `created_at`.
    ///
    /// # Errors
    /// Returns `TeeError::InternalServerError` if the bundle cannot be built.
    pub fn from_key_pairs(
        key_pairs: KeyPairs,
        signer: &SigningKey,
        certificate_der: &[u8],
        config: ServerKeysConfig,
        created_at: SystemTime,
    ) -> Result<Self, TeeError> {
        let iat = unix_seconds(created_at)?;
        let lifetime = i64::try_from(config.signed_keys_lifetime.as_secs())
            .map_err(|_| TeeError::InternalServerError("signed key lifetime overflow".into()))?;
        let vau_keys = VauKeys {
            ecdh_public_key: key_pairs.public.ecdh.clone(),
            kyber768_public_key: key_pairs.public.kyber768.clone(),
            iat,
            exp: iat.saturating_add(lifetime),
            comment: config.comment.clone(),
        };
        let signed_pub_keys = to_cbor(&vau_keys).map_err(|e| {
            error!("encoding VauKeys failed: {e}");
            TeeError::InternalServerError("encoding VauKeys failed".into())
        })?;
        let signature: Signature = signer.sign(&signed_pub_keys);
        let signed = SignedPublicKeys {
            signed_pub_keys,
            signature_es256: signature.to_bytes().to_vec(),
            cert_hash: Sha256::digest(certificate_der).to_vec(),
            cdv: config.cdv,
            ocsp_response: Vec::new(),
        };
        debug!(iat, exp = vau_keys.exp, "signed TEE3 server public keys");
        Ok(Self {
            key_pairs,
            vau_keys,
            signed,
            created_at,
            config,
        })
    }

    #[must_use]
    pub fn vau_keys(&self) -> &VauKeys {
        &self.vau_keys
    }

    #[must_use]
    pub fn public_keys(&self) -> &PublicKeys {
        &self.key_pairs.public
    }

    #[must_use]
    pub fn created_at(&self) -> SystemTime {
        self.created_at
    }

    fn key_age(&self) -> Duration {
        SystemTime::now()
            .duration_since(self.created_at)
            .unwrap_or_default()
    }

    fn ensure_key_age(&self) -> Result<(), TeeError> {
        let age = self.key_age();
        if age > self.config.max_key_age {
            error!(
                age_secs = age.as_secs(),
                "TEE3 server key pairs exceeded their maximum age"
            );
            return Err(TeeError::InternalServerError(
                "server key pairs too old".into(),
            ));
        }
        Ok(())
    }
}

impl ServerKeys for InMemoryServerKeys {
    fn signed_public_keys(&self) -> Result<SignedPublicKeys, TeeError> {
        self.ensure_key_age()?;
        Ok(self.signed.clone())
    }

    fn private_keys(&self) -> Result<&PrivateKeys, TeeError> {
        self.ensure_key_age()?;
        Ok(&self.key_pairs.private)
    }
}
