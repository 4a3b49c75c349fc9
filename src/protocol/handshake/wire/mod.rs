//! CBOR wire layer for the TEE3 handshake.
//!
//! Inbound messages are decoded strictly and every failure is folded into a
//! [`TeeError`]: a missing map entry becomes `MissingParameters`, anything
//! else the client could have caused becomes `DecodingError`. Outbound
//! encoding failures are the server's fault and surface as
//! `InternalServerError`.

pub mod inbound;
pub mod outbound;

pub use inbound::{decode_message1, decode_message3, decode_message3_inner};
pub use outbound::{
    encode_error_message, encode_message2, encode_message4, encode_signed_public_keys,
};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::error;

use crate::core::cbor::{CodecError, CodecErrorKind, from_cbor, to_cbor};
use crate::domain::handshake::{TeeError, TypedMessage};

fn decode_error(label: &str, err: &CodecError) -> TeeError {
    error!(what = label, "decoding failed: {err}");
    match err.kind() {
        CodecErrorKind::MissingItem => TeeError::MissingParameters(format!("{label}: {err}")),
        CodecErrorKind::Malformed => TeeError::DecodingError(format!("{label}: {err}")),
        CodecErrorKind::Other => TeeError::InternalServerError(format!("{label}: {err}")),
    }
}

/// Decode an untagged structure (inner layers, signed bundles).
///
/// # Errors
/// See the module docs for the mapping.
pub fn decode_as<T: DeserializeOwned>(bytes: &[u8], label: &str) -> Result<T, TeeError> {
    from_cbor(bytes).map_err(|e| decode_error(label, &e))
}

/// Decode a message and check its `MessageType` discriminator.
///
/// # Errors
/// As [`decode_as`], plus `TeeError::DecodingError` for a wrong
/// discriminator.
pub fn decode_typed<T: DeserializeOwned + TypedMessage>(bytes: &[u8]) -> Result<T, TeeError> {
    let msg: T = decode_as(bytes, T::MESSAGE_TYPE)?;
    if msg.message_type() != T::MESSAGE_TYPE {
        error!(
            expected = T::MESSAGE_TYPE,
            got = msg.message_type(),
            "unexpected MessageType"
        );
        return Err(TeeError::DecodingError(format!(
            "expected MessageType {}, got {:?}",
            T::MESSAGE_TYPE,
            msg.message_type()
        )));
    }
    Ok(msg)
}

/// Encode any outbound structure.
///
/// # Errors
/// Returns `TeeError::InternalServerError` if serialization fails.
pub fn encode_as<T: Serialize>(value: &T, label: &str) -> Result<Vec<u8>, TeeError> {
    to_cbor(value).map_err(|e| {
        error!(what = label, "encoding failed: {e}");
        TeeError::InternalServerError(format!("encoding {label} failed"))
    })
}
