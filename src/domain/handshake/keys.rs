use core::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::handshake::byte_buf;
use crate::domain::handshake::params::{
    ECDH_COORDINATE_LEN, ECDH_CURVE, KEY_ID_LEN, KYBER768_CIPHERTEXT_LEN,
    KYBER768_PUBLIC_KEY_LEN,
};

/// P-256 public key as it travels on the wire: curve name plus raw affine
/// coordinates. Also used as the "ciphertext" of the ECDH half of the KEM.
///
/// Nothing here is checked at decode time; [`EcdhPublicKey::is_well_formed`]
/// covers the shape and `core::crypto::ecdh` the curve membership.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EcdhPublicKey {
    #[serde(rename = "crv")]
    pub curve: String,
    #[serde(with = "byte_buf")]
    pub x: Vec<u8>,
    #[serde(with = "byte_buf")]
    pub y: Vec<u8>,
}

impl EcdhPublicKey {
    #[must_use]
    pub fn new(x: [u8; ECDH_COORDINATE_LEN], y: [u8; ECDH_COORDINATE_LEN]) -> Self {
        Self {
            curve: ECDH_CURVE.to_owned(),
            x: x.to_vec(),
            y: y.to_vec(),
        }
    }

    /// Curve name is `P-256` and both coordinates are exactly 32 bytes.
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        self.curve == ECDH_CURVE
            && self.x.len() == ECDH_COORDINATE_LEN
            && self.y.len() == ECDH_COORDINATE_LEN
    }
}

impl fmt::Debug for EcdhPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "EcdhPublicKey({}, x={}, y={})",
            self.curve,
            hex::encode(&self.x),
            hex::encode(&self.y)
        )
    }
}

/// Kyber768 encapsulation key (1184 bytes when valid).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kyber768PublicKey(#[serde(with = "byte_buf")] pub Vec<u8>);

impl Kyber768PublicKey {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn has_valid_length(&self) -> bool {
        self.0.len() == KYBER768_PUBLIC_KEY_LEN
    }
}

impl fmt::Debug for Kyber768PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kyber768PublicKey({} bytes)", self.0.len())
    }
}

/// Kyber768 ciphertext (1088 bytes when valid).
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kyber768CipherText(#[serde(with = "byte_buf")] pub Vec<u8>);

impl Kyber768CipherText {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn has_valid_length(&self) -> bool {
        self.0.len() == KYBER768_CIPHERTEXT_LEN
    }
}

impl fmt::Debug for Kyber768CipherText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kyber768CipherText({} bytes)", self.0.len())
    }
}

/// The two transmissible halves of one hybrid encapsulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CipherTexts {
    pub ecdh: EcdhPublicKey,
    pub kyber768: Kyber768CipherText,
}

/// Session key identifier, the last 32 bytes of the K2 derivation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyId(pub [u8; KEY_ID_LEN]);

impl KeyId {
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_ID_LEN] {
        &self.0
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KeyId({})", self.to_hex())
    }
}
