use thiserror::Error;

use crate::domain::handshake::messages::ErrorMessage;

/// ---- Protocol error type ----
/// Every kind is terminal for the handshake attempt that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TeeError {
    /// A required message field or request header was absent.
    #[error("missing parameters: {0}")]
    MissingParameters(String),
    /// Inbound bytes were not a well-formed message.
    #[error("decoding error: {0}")]
    DecodingError(String),
    /// Unclassified failure on the server side.
    #[error("internal server error: {0}")]
    InternalServerError(String),
    /// A peer public key failed validation. Deliberately carries no detail.
    #[error("failed public key verification")]
    FailedPublicKeyVerification,
    /// Any AEAD failure. Only the caller-chosen description is kept.
    #[error("AES-GCM decryption failure: {0}")]
    GcmDecryptionFailure(String),
    /// Client and server transcripts disagree.
    #[error("transcript error: {0}")]
    TransscriptError(String),
    /// An operation was called in a state that does not allow it.
    #[error("invalid handshake state: {0}")]
    InvalidState(&'static str),
}

impl TeeError {
    /// Numeric code sent in [`ErrorMessage::error_code`].
    #[must_use]
    pub fn error_code(&self) -> i64 {
        match self {
            Self::MissingParameters(_) => 1,
            Self::DecodingError(_) => 2,
            Self::InternalServerError(_) => 3,
            Self::FailedPublicKeyVerification => 4,
            Self::GcmDecryptionFailure(_) => 5,
            Self::TransscriptError(_) => 6,
            Self::InvalidState(_) => 7,
        }
    }

    /// HTTP status the transport should answer with.
    #[must_use]
    pub fn http_status(&self) -> u16 {
        match self {
            Self::InternalServerError(_) | Self::InvalidState(_) => 500,
            _ => 400,
        }
    }

    /// Body for the HTTP error response. Server-side details stay in the log.
    #[must_use]
    pub fn to_error_message(&self) -> ErrorMessage {
        let text = match self {
            Self::InternalServerError(_) | Self::InvalidState(_) => "internal server error".to_owned(),
            other => other.to_string(),
        };
        ErrorMessage::new(self.error_code(), text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct() {
        let all = [
            TeeError::MissingParameters(String::new()),
            TeeError::DecodingError(String::new()),
            TeeError::InternalServerError(String::new()),
            TeeError::FailedPublicKeyVerification,
            TeeError::GcmDecryptionFailure(String::new()),
            TeeError::TransscriptError(String::new()),
            TeeError::InvalidState("x"),
        ];
        let mut codes: Vec<i64> = all.iter().map(TeeError::error_code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), all.len());
    }

    #[test]
    fn status_mapping() {
        assert_eq!(TeeError::MissingParameters("m".into()).http_status(), 400);
        assert_eq!(TeeError::FailedPublicKeyVerification.http_status(), 400);
        assert_eq!(TeeError::InternalServerError("i".into()).http_status(), 500);
        assert_eq!(TeeError::InvalidState("s").http_status(), 500);
    }

    #[test]
    fn internal_details_are_not_sent() {
        let msg = TeeError::InternalServerError("hsm pool exhausted".into()).to_error_message();
        assert_eq!(msg.error_code, 3);
        assert!(!msg.error_message.contains("hsm"));

        let msg = TeeError::GcmDecryptionFailure("M3 inner layer".into()).to_error_message();
        assert!(msg.error_message.contains("M3 inner layer"));
    }
}
