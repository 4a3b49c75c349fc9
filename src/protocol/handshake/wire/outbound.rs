//! Messages and bodies the server produces.

use super::encode_as;
use crate::domain::handshake::{
    ErrorMessage, Message2, Message4, SignedPublicKeys, TeeError, TypedMessage,
};

/// # Errors
/// `TeeError::InternalServerError` if serialization fails.
pub fn encode_message2(m2: &Message2) -> Result<Vec<u8>, TeeError> {
    encode_as(m2, Message2::MESSAGE_TYPE)
}

/// # Errors
/// `TeeError::InternalServerError` if serialization fails.
pub fn encode_message4(m4: &Message4) -> Result<Vec<u8>, TeeError> {
    encode_as(m4, Message4::MESSAGE_TYPE)
}

/// Plaintext of `Message2::aead_cipher_text`.
///
/// # Errors
/// `TeeError::InternalServerError` if serialization fails.
pub fn encode_signed_public_keys(keys: &SignedPublicKeys) -> Result<Vec<u8>, TeeError> {
    encode_as(keys, "signed public keys")
}

/// CBOR body for an HTTP error response.
///
/// # Errors
/// `TeeError::InternalServerError` if serialization fails.
pub fn encode_error_message(err: &TeeError) -> Result<Vec<u8>, TeeError> {
    let body: ErrorMessage = err.to_error_message();
    encode_as(&body, ErrorMessage::MESSAGE_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_cbor::Value;

    fn lookup<'a>(map: &'a std::collections::BTreeMap<Value, Value>, key: &str) -> &'a Value {
        &map[&Value::Text(key.to_owned())]
    }

    #[test]
    fn error_body_hides_internal_detail() {
        let bytes =
            encode_error_message(&TeeError::InternalServerError("hsm slot 3 offline".into()))
                .unwrap();
        let Value::Map(map) = serde_cbor::from_slice::<Value>(&bytes).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(lookup(&map, "MessageType"), &Value::Text("Error".into()));
        assert_eq!(lookup(&map, "ErrorCode"), &Value::Integer(3));
        let Value::Text(text) = lookup(&map, "ErrorMessage") else {
            panic!("expected text");
        };
        assert!(!text.contains("hsm"));
    }

    #[test]
    fn message4_is_a_typed_map() {
        let bytes = encode_message4(&Message4::new(vec![0xAA; 60])).unwrap();
        let Value::Map(map) = serde_cbor::from_slice::<Value>(&bytes).unwrap() else {
            panic!("expected map");
        };
        assert_eq!(lookup(&map, "MessageType"), &Value::Text("M4".into()));
        assert_eq!(
            lookup(&map, "AEAD_ct_key_confirmation"),
            &Value::Bytes(vec![0xAA; 60])
        );
    }
}
