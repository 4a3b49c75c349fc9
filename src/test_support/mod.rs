//! Fixtures shared by unit and integration tests.
//!
//! Not part of the supported API.

mod client;
mod fixed_keys;

pub use client::ReferenceClient;
pub use fixed_keys::{FIXED_KEYS_LIFETIME_SECS, FixedServerKeys};

use std::collections::HashMap;

use p256::ecdsa::SigningKey;
use rand_core::CryptoRngCore;

use crate::adapters::keys::{InMemoryServerKeys, ServerKeysConfig};
use crate::application::handshake::{CLUSTER_ADDRESS_HEADER, POD_ADDRESS_HEADER};
use crate::domain::handshake::TeeError;

pub const TEST_CERTIFICATE: &[u8] = b"test signer certificate";

/// ES256 identity plus a freshly generated, signed key set.
///
/// # Errors
/// Propagates bundle construction failures.
pub fn mk_server_keys<R: CryptoRngCore>(
    rng: &mut R,
) -> Result<(SigningKey, InMemoryServerKeys), TeeError> {
    let signer = SigningKey::random(rng);
    let keys =
        InMemoryServerKeys::generate(&signer, TEST_CERTIFICATE, ServerKeysConfig::default(), rng)?;
    Ok((signer, keys))
}

/// Router headers with the default names.
#[must_use]
pub fn mk_headers(cluster: &str, pod: &str) -> HashMap<String, String> {
    HashMap::from([
        (CLUSTER_ADDRESS_HEADER.to_owned(), cluster.to_owned()),
        (POD_ADDRESS_HEADER.to_owned(), pod.to_owned()),
    ])
}
