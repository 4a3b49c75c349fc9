//! TEE3 key schedule.
//!
//! Two HKDF-SHA-256 derivations, both without salt and info:
//! - K1 from the ephemeral hybrid secrets (after M2),
//! - K2 and the KeyId from ephemeral plus static secrets (after M3).
//!
//! The byte offsets below are part of the wire contract with every client.

use zeroize::Zeroizing;

use crate::core::crypto::hkdf::{HkdfError, hkdf};
use crate::domain::handshake::KeyId;
use crate::domain::handshake::params::KEY_ID_LEN;
use crate::ports::crypto::{AEAD_KEY_LEN, AeadKey, SHARED_SECRET_LEN, SharedKeys, SymmetricKeys};

/// `ECDH || Kyber` of one encapsulation.
pub const K1_INPUT_LEN: usize = 2 * SHARED_SECRET_LEN;
pub const K1_OUTPUT_LEN: usize = 2 * AEAD_KEY_LEN;
/// `ECDH-e || Kyber-e || ECDH-s || Kyber-s`.
pub const K2_INPUT_LEN: usize = 4 * SHARED_SECRET_LEN;
pub const K2_OUTPUT_LEN: usize = 4 * AEAD_KEY_LEN + KEY_ID_LEN;

/// Everything the second derivation yields. Consumed by destructuring.
///
/// ```compile_fail
/// fn duplicate<T: Clone>(_: &T) {}
/// fn check(keys: &tee3_handshake::protocol::handshake::keyschedule::K2Keys) {
///     duplicate(keys);
/// }
/// ```
#[derive(Debug)]
pub struct K2Keys {
    pub key_confirmation: SymmetricKeys,
    pub application_data: SymmetricKeys,
    pub key_id: KeyId,
}

fn key_at(okm: &[u8], offset: usize) -> AeadKey {
    let mut k = [0u8; AEAD_KEY_LEN];
    k.copy_from_slice(&okm[offset..offset + AEAD_KEY_LEN]);
    AeadKey(k)
}

/// K1: `[0,32)` client -> server, `[32,64)` server -> client.
///
/// # Errors
/// Propagates `HkdfError` (not reachable with these fixed lengths).
pub fn derive_k1(shared: &SharedKeys) -> Result<SymmetricKeys, HkdfError> {
    let mut ikm = Zeroizing::new([0u8; K1_INPUT_LEN]);
    ikm[..SHARED_SECRET_LEN].copy_from_slice(shared.ecdh.as_bytes());
    ikm[SHARED_SECRET_LEN..].copy_from_slice(shared.kyber768.as_bytes());
    let mut okm = Zeroizing::new([0u8; K1_OUTPUT_LEN]);
    hkdf(ikm.as_slice(), okm.as_mut_slice())?;
    Ok(SymmetricKeys {
        client_to_server: key_at(okm.as_slice(), 0),
        server_to_client: key_at(okm.as_slice(), 32),
    })
}

/// Concatenate ephemeral and static secrets in their fixed order.
#[must_use]
pub fn combine(ephemeral: &SharedKeys, fixed: &SharedKeys) -> Zeroizing<[u8; K2_INPUT_LEN]> {
    let mut out = Zeroizing::new([0u8; K2_INPUT_LEN]);
    for (i, part) in [
        &ephemeral.ecdh,
        &ephemeral.kyber768,
        &fixed.ecdh,
        &fixed.kyber768,
    ]
    .into_iter()
    .enumerate()
    {
        out[i * SHARED_SECRET_LEN..(i + 1) * SHARED_SECRET_LEN].copy_from_slice(part.as_bytes());
    }
    out
}

/// K2 and KeyId from the 128-byte combined secret:
/// `[0,32)` kc c2s, `[32,64)` app c2s, `[64,96)` kc s2c, `[96,128)` app s2c,
/// `[128,160)` KeyId.
///
/// # Errors
/// Propagates `HkdfError` (not reachable with these fixed lengths).
pub fn derive_k2(combined: &[u8; K2_INPUT_LEN]) -> Result<K2Keys, HkdfError> {
    let mut okm = Zeroizing::new([0u8; K2_OUTPUT_LEN]);
    hkdf(combined, okm.as_mut_slice())?;
    let okm = okm.as_slice();
    let mut key_id = [0u8; KEY_ID_LEN];
    key_id.copy_from_slice(&okm[128..160]);
    Ok(K2Keys {
        key_confirmation: SymmetricKeys {
            client_to_server: key_at(okm, 0),
            server_to_client: key_at(okm, 64),
        },
        application_data: SymmetricKeys {
            client_to_server: key_at(okm, 32),
            server_to_client: key_at(okm, 96),
        },
        key_id: KeyId(key_id),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::crypto::SharedSecret;

    fn h(s: &str) -> [u8; 32] {
        let mut out = [0u8; 32];
        out.copy_from_slice(&hex::decode(s).unwrap());
        out
    }

    fn counting<const N: usize>() -> [u8; N] {
        core::array::from_fn(|i| u8::try_from(i).unwrap())
    }

    // Vectors computed with an independent HMAC-SHA256 HKDF over 0x00..0x7f.
    #[test]
    fn k2_known_answer() {
        let k2 = derive_k2(&counting::<K2_INPUT_LEN>()).unwrap();
        assert_eq!(
            k2.key_confirmation.client_to_server.0,
            h("d030a065c4f99245756b6fc30d00a2948f3e53ebfdb922e5442b80b7f50416b9")
        );
        assert_eq!(
            k2.application_data.client_to_server.0,
            h("41e6b5264119fa431d7957453412bb13e412f7a80ffb7a1a820085e0dd51c820")
        );
        assert_eq!(
            k2.key_confirmation.server_to_client.0,
            h("786a1addf56b5df2b0026794407111d58c2dee06e4b7428b73db7dfeb2266812")
        );
        assert_eq!(
            k2.application_data.server_to_client.0,
            h("80eac1edb1504a537d3b60cae9a24124c13c19389a4f2ac4b285e57fa0d1494a")
        );
        assert_eq!(
            k2.key_id.0,
            h("9573486fe8f69c4a3c689fa40f59e1790024641bba8f9c82aef62b4f74e7dd56")
        );
    }

    #[test]
    fn k1_known_answer() {
        let input = counting::<K1_INPUT_LEN>();
        let mut ecdh = [0u8; 32];
        let mut kyber = [0u8; 32];
        ecdh.copy_from_slice(&input[..32]);
        kyber.copy_from_slice(&input[32..]);
        let k1 = derive_k1(&SharedKeys {
            ecdh: SharedSecret(ecdh),
            kyber768: SharedSecret(kyber),
        })
        .unwrap();
        assert_eq!(
            k1.client_to_server.0,
            h("549c5c703972059ea6fdff15c34ebbcc4a8e45917c78c17f1bb365c2465147bb")
        );
        assert_eq!(
            k1.server_to_client.0,
            h("1b65bc9ecae00b2c7c5bcb6f986cab7518bc6a1cf485202d8a6e4d0a936faf31")
        );
    }

    #[test]
    fn combine_order_is_fixed() {
        let e = SharedKeys {
            ecdh: SharedSecret([1; 32]),
            kyber768: SharedSecret([2; 32]),
        };
        let s = SharedKeys {
            ecdh: SharedSecret([3; 32]),
            kyber768: SharedSecret([4; 32]),
        };
        let c = combine(&e, &s);
        for (i, chunk) in c.chunks(32).enumerate() {
            assert!(chunk.iter().all(|b| usize::from(*b) == i + 1));
        }
    }
}
