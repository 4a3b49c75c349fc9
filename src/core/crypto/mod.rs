pub mod ecdh;
pub mod hkdf;
pub mod kyber768;

pub use ecdh::EcdhError;
pub use hkdf::HkdfError;
pub use kyber768::KemError;

use rand_core::CryptoRngCore;

use crate::ports::crypto::{KeyPairs, PrivateKeys, PublicKeys};

/// Generate a fresh P-256 + Kyber768 key pair set.
pub fn generate_key_pairs<R: CryptoRngCore>(rng: &mut R) -> KeyPairs {
    let (ecdh_public, ecdh_private) = ecdh::generate_key_pair(rng);
    let (kyber_public, kyber_private) = kyber768::create_key_pair(rng);
    KeyPairs {
        public: PublicKeys {
            ecdh: ecdh_public,
            kyber768: kyber_public,
        },
        private: PrivateKeys {
            ecdh: ecdh_private,
            kyber768: kyber_private,
        },
    }
}
