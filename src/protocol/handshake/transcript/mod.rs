//! Handshake transcript: the exact serialized bytes of M1, M2 and M3.
//!
//! ## Responsibilities
//! - Keep the raw bytes, append-only, in strict message order.
//! - Hash them with **SHA-256** for key confirmation.
//!
//! ## Non-responsibilities
//! - No re-encoding: bytes are absorbed exactly as received or sent, so
//!   both sides hash the same octets whatever CBOR encoder produced them.
//! - Never retransmitted.

use sha2::{Digest, Sha256};

pub const TRANSCRIPT_HASH_LEN: usize = 32;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Transcript {
    bytes: Vec<u8>,
}

impl Transcript {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript after the first round trip: `M1 || M2`.
    #[must_use]
    pub fn from_messages(serialized_m1: &[u8], serialized_m2: &[u8]) -> Self {
        let mut t = Self {
            bytes: Vec::with_capacity(serialized_m1.len() + serialized_m2.len()),
        };
        t.append(serialized_m1);
        t.append(serialized_m2);
        t
    }

    pub fn append(&mut self, serialized_message: &[u8]) {
        self.bytes.extend_from_slice(serialized_message);
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// `SHA-256(transcript)`.
    #[must_use]
    pub fn hash(&self) -> [u8; TRANSCRIPT_HASH_LEN] {
        Sha256::digest(&self.bytes).into()
    }

    /// `SHA-256(transcript || extra)` without extending the transcript.
    #[must_use]
    pub fn hash_with(&self, extra: &[u8]) -> [u8; TRANSCRIPT_HASH_LEN] {
        let mut h = Sha256::new();
        h.update(&self.bytes);
        h.update(extra);
        h.finalize().into()
    }
}
