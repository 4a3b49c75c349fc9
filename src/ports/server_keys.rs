//! Static key material boundary.
//!
//! The handshake never provisions or rotates its long-term keys. It asks an
//! implementor of [`ServerKeys`] for the signed public bundle (sent in M2) and
//! for the matching private keys (used to decapsulate M3).

use crate::domain::handshake::{SignedPublicKeys, TeeError};
use crate::ports::crypto::PrivateKeys;

pub trait ServerKeys {
    /// The signed public-key bundle for M2.
    /// # Errors
    /// Returns `TeeError::InternalServerError` if no valid bundle is available.
    fn signed_public_keys(&self) -> Result<SignedPublicKeys, TeeError>;

    /// Private keys matching the published bundle.
    /// # Errors
    /// Returns `TeeError::InternalServerError` if the keys are unusable.
    fn private_keys(&self) -> Result<&PrivateKeys, TeeError>;
}

impl<K: ServerKeys + ?Sized> ServerKeys for &K {
    fn signed_public_keys(&self) -> Result<SignedPublicKeys, TeeError> {
        (**self).signed_public_keys()
    }

    fn private_keys(&self) -> Result<&PrivateKeys, TeeError> {
        (**self).private_keys()
    }
}

impl<K: ServerKeys + ?Sized> ServerKeys for std::sync::Arc<K> {
    fn signed_public_keys(&self) -> Result<SignedPublicKeys, TeeError> {
        (**self).signed_public_keys()
    }

    fn private_keys(&self) -> Result<&PrivateKeys, TeeError> {
        (**self).private_keys()
    }
}
