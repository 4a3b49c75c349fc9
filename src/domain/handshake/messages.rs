/*
`Handshake` message type definitions for TEE3 (gematik VAU protocol).

Four messages are exchanged: `M1 -> M2 -> M3 -> M4`. Each is a CBOR map with
a `MessageType` discriminator and the gematik field names. Field declaration
order is the encoding order, which keeps server output byte-stable.

Secret material never appears here: the maps carry public keys, KEM
ciphertexts and AEAD blobs only.
*/

use serde::{Deserialize, Serialize};

use crate::domain::handshake::byte_buf;
use crate::domain::handshake::keys::{
    CipherTexts, EcdhPublicKey, Kyber768CipherText, Kyber768PublicKey,
};

pub const MESSAGE_TYPE_M1: &str = "M1";
pub const MESSAGE_TYPE_M2: &str = "M2";
pub const MESSAGE_TYPE_M3: &str = "M3";
pub const MESSAGE_TYPE_M4: &str = "M4";
pub const MESSAGE_TYPE_ERROR: &str = "Error";

/// Messages that carry a `MessageType` discriminator.
pub trait TypedMessage {
    /// Discriminator value this message must carry.
    const MESSAGE_TYPE: &'static str;

    fn message_type(&self) -> &str;
}

macro_rules! impl_typed_message {
    ($name:ident, $tag:expr) => {
        impl TypedMessage for $name {
            const MESSAGE_TYPE: &'static str = $tag;

            fn message_type(&self) -> &str {
                &self.message_type
            }
        }
    };
}

/// M1, client -> server: the client's ephemeral public keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message1 {
    #[serde(rename = "MessageType")]
    pub message_type: String,
    #[serde(rename = "ECDH_PK")]
    pub ecdh_public_key: EcdhPublicKey,
    #[serde(rename = "Kyber768_PK")]
    pub kyber768_public_key: Kyber768PublicKey,
}

impl Message1 {
    #[must_use]
    pub fn new(ecdh_public_key: EcdhPublicKey, kyber768_public_key: Kyber768PublicKey) -> Self {
        Self {
            message_type: MESSAGE_TYPE_M1.to_owned(),
            ecdh_public_key,
            kyber768_public_key,
        }
    }
}
impl_typed_message!(Message1, MESSAGE_TYPE_M1);

/// M2, server -> client: encapsulations to the client's keys plus the
/// server's signed static keys under K1 (server -> client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message2 {
    #[serde(rename = "MessageType")]
    pub message_type: String,
    #[serde(rename = "ECDH_ct")]
    pub ecdh_cipher_text: EcdhPublicKey,
    #[serde(rename = "Kyber768_ct")]
    pub kyber768_cipher_text: Kyber768CipherText,
    #[serde(rename = "AEAD_ct", with = "byte_buf")]
    pub aead_cipher_text: Vec<u8>,
}

impl Message2 {
    #[must_use]
    pub fn new(cipher_texts: CipherTexts, aead_cipher_text: Vec<u8>) -> Self {
        Self {
            message_type: MESSAGE_TYPE_M2.to_owned(),
            ecdh_cipher_text: cipher_texts.ecdh,
            kyber768_cipher_text: cipher_texts.kyber768,
            aead_cipher_text,
        }
    }

    #[must_use]
    pub fn cipher_texts(&self) -> CipherTexts {
        CipherTexts {
            ecdh: self.ecdh_cipher_text.clone(),
            kyber768: self.kyber768_cipher_text.clone(),
        }
    }
}
impl_typed_message!(Message2, MESSAGE_TYPE_M2);

/// M3, client -> server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message3 {
    #[serde(rename = "MessageType")]
    pub message_type: String,
    /// [`Message3InnerLayer`] under K1 (client -> server).
    #[serde(rename = "AEAD_ct", with = "byte_buf")]
    pub aead_cipher_text: Vec<u8>,
    /// Client transcript hash under K2 key confirmation (client -> server).
    #[serde(rename = "AEAD_ct_key_confirmation", with = "byte_buf")]
    pub aead_cipher_text_key_confirmation: Vec<u8>,
}

impl Message3 {
    #[must_use]
    pub fn new(aead_cipher_text: Vec<u8>, aead_cipher_text_key_confirmation: Vec<u8>) -> Self {
        Self {
            message_type: MESSAGE_TYPE_M3.to_owned(),
            aead_cipher_text,
            aead_cipher_text_key_confirmation,
        }
    }
}
impl_typed_message!(Message3, MESSAGE_TYPE_M3);

/// Plaintext of `Message3::aead_cipher_text`: the client's encapsulations to
/// the server's static keys plus two client capability flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message3InnerLayer {
    #[serde(rename = "ECDH_ct")]
    pub ecdh_cipher_text: EcdhPublicKey,
    #[serde(rename = "Kyber768_ct")]
    pub kyber768_cipher_text: Kyber768CipherText,
    #[serde(rename = "ERP", default)]
    pub erp: bool,
    #[serde(rename = "ESO", default)]
    pub eso: bool,
}

impl Message3InnerLayer {
    #[must_use]
    pub fn new(cipher_texts: CipherTexts) -> Self {
        Self {
            ecdh_cipher_text: cipher_texts.ecdh,
            kyber768_cipher_text: cipher_texts.kyber768,
            erp: false,
            eso: false,
        }
    }

    #[must_use]
    pub fn cipher_texts(&self) -> CipherTexts {
        CipherTexts {
            ecdh: self.ecdh_cipher_text.clone(),
            kyber768: self.kyber768_cipher_text.clone(),
        }
    }
}

/// M4, server -> client: the server transcript hash under K2 key
/// confirmation (server -> client).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message4 {
    #[serde(rename = "MessageType")]
    pub message_type: String,
    #[serde(rename = "AEAD_ct_key_confirmation", with = "byte_buf")]
    pub aead_cipher_text_key_confirmation: Vec<u8>,
}

impl Message4 {
    #[must_use]
    pub fn new(aead_cipher_text_key_confirmation: Vec<u8>) -> Self {
        Self {
            message_type: MESSAGE_TYPE_M4.to_owned(),
            aead_cipher_text_key_confirmation,
        }
    }
}
impl_typed_message!(Message4, MESSAGE_TYPE_M4);

/// Body returned to the client when a handshake step fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    #[serde(rename = "MessageType")]
    pub message_type: String,
    #[serde(rename = "ErrorCode")]
    pub error_code: i64,
    #[serde(rename = "ErrorMessage")]
    pub error_message: String,
}

impl ErrorMessage {
    #[must_use]
    pub fn new(error_code: i64, error_message: impl Into<String>) -> Self {
        Self {
            message_type: MESSAGE_TYPE_ERROR.to_owned(),
            error_code,
            error_message: error_message.into(),
        }
    }
}
impl_typed_message!(ErrorMessage, MESSAGE_TYPE_ERROR);

/// The server's static public keys with their validity window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VauKeys {
    #[serde(rename = "ECDH_PK")]
    pub ecdh_public_key: EcdhPublicKey,
    #[serde(rename = "Kyber768_PK")]
    pub kyber768_public_key: Kyber768PublicKey,
    /// Issued at, seconds since the epoch.
    pub iat: i64,
    /// Expires at, seconds since the epoch.
    pub exp: i64,
    pub comment: String,
}

/// [`VauKeys`] signed with the server's ES256 identity; the plaintext of
/// `Message2::aead_cipher_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedPublicKeys {
    /// CBOR encoding of [`VauKeys`].
    #[serde(with = "byte_buf")]
    pub signed_pub_keys: Vec<u8>,
    /// Raw `r || s` ECDSA P-256 signature over `signed_pub_keys`.
    #[serde(rename = "signature-ES256", with = "byte_buf")]
    pub signature_es256: Vec<u8>,
    /// SHA-256 of the signer certificate (DER).
    #[serde(with = "byte_buf")]
    pub cert_hash: Vec<u8>,
    /// Certificate data version.
    pub cdv: u64,
    #[serde(with = "byte_buf")]
    pub ocsp_response: Vec<u8>,
}
