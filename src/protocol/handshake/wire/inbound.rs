//! Messages the server receives.

use super::{decode_as, decode_typed};
use crate::domain::handshake::{Message1, Message3, Message3InnerLayer, TeeError};

/// Decode M1.
///
/// # Errors
/// `MissingParameters` for an absent field, `DecodingError` otherwise.
pub fn decode_message1(bytes: &[u8]) -> Result<Message1, TeeError> {
    decode_typed(bytes)
}

/// Decode M3 (outer layer only).
///
/// # Errors
/// `MissingParameters` for an absent field, `DecodingError` otherwise.
pub fn decode_message3(bytes: &[u8]) -> Result<Message3, TeeError> {
    decode_typed(bytes)
}

/// Decode the plaintext of `Message3::aead_cipher_text`.
///
/// # Errors
/// `MissingParameters` for an absent field, `DecodingError` otherwise.
pub fn decode_message3_inner(bytes: &[u8]) -> Result<Message3InnerLayer, TeeError> {
    decode_as(bytes, "M3 inner layer")
}
