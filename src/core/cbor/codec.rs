//! Generic CBOR codec helpers used by the handshake wire layer.
//!
//! This module is *infrastructure*, not protocol-specific:
//! - `to_cbor` serializes any `T: Serialize` with **ciborium**. Struct fields are
//!   written in declaration order, so encoding is stable for a given value.
//! - `from_cbor` deserializes strictly (no trailing bytes). Canonical form is
//!   not enforced: peers order map keys as they please.
//!
//! Decode failures are classified with [`CodecError::kind`] so callers can tell a
//! missing required field apart from malformed bytes.

use serde::{Serialize, de::DeserializeOwned};
use std::io::Cursor;

/// Errors produced by the generic codec.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// Error produced during serialization.
    #[error("CBOR serialize error: {0}")]
    Ser(#[from] ciborium::ser::Error<std::io::Error>),

    /// Error produced during deserialization.
    #[error("CBOR deserialize error: {0}")]
    De(#[from] ciborium::de::Error<std::io::Error>),

    /// A complete item was decoded but more bytes followed it.
    #[error("trailing bytes after CBOR value ({0} unread)")]
    TrailingBytes(usize),
}

/// Coarse classification of a codec failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// A required map entry was absent.
    MissingItem,
    /// The input is not valid CBOR or does not fit the target type.
    Malformed,
    /// Anything else (serializer failures, recursion limits).
    Other,
}

impl CodecError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> CodecErrorKind {
        match self {
            Self::De(ciborium::de::Error::Semantic(_, msg)) if msg.starts_with("missing field") => {
                CodecErrorKind::MissingItem
            }
            Self::De(
                ciborium::de::Error::Semantic(..)
                | ciborium::de::Error::Syntax(_)
                | ciborium::de::Error::Io(_),
            )
            | Self::TrailingBytes(_) => CodecErrorKind::Malformed,
            Self::De(ciborium::de::Error::RecursionLimitExceeded) | Self::Ser(_) => {
                CodecErrorKind::Other
            }
        }
    }
}

/// Serialize any `T: Serialize` to CBOR bytes.
///
/// # Errors
///
/// Returns a [`CodecError::Ser`] if serialization fails.
pub fn to_cbor<T: Serialize>(v: &T) -> Result<Vec<u8>, CodecError> {
    let mut buf = Vec::with_capacity(256);
    ciborium::ser::into_writer(v, &mut buf)?;
    Ok(buf)
}

/// Deserialize any `T: DeserializeOwned` from CBOR bytes.
///
/// The input must hold exactly one CBOR item.
///
/// # Errors
///
/// * [`CodecError::De`] if deserialization fails.
/// * [`CodecError::TrailingBytes`] if bytes remain after the item.
pub fn from_cbor<T: DeserializeOwned>(b: &[u8]) -> Result<T, CodecError> {
    let mut cur = Cursor::new(b);
    let value: T = ciborium::de::from_reader(&mut cur)?;
    let pos = usize::try_from(cur.position()).unwrap_or(usize::MAX);
    if pos < b.len() {
        return Err(CodecError::TrailingBytes(b.len() - pos));
    }
    Ok(value)
}
