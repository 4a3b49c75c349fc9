//! Crate root for `tee3-handshake`.
//!
//! Server side of the TEE3 handshake (gematik VAU protocol): a hybrid
//! P-256 ECDH + Kyber768 key agreement in four CBOR messages, with
//! HKDF-SHA-256 key derivation and AES-256-GCM key confirmation.
//!
//! High-level tree:
//! * `core` – CBOR codec and the raw primitives (ECDH, Kyber768, HKDF).
//! * `domain::handshake` – wire messages, `VauCid`, `Tee3Context`, `TeeError`.
//! * `ports` – seams for AEAD, static server keys and request headers.
//! * `adapters` – AES-256-GCM and an in-memory key store.
//! * `protocol::handshake` – key schedule, transcript, wire mapping.
//! * `application::handshake` – [`ServerTeeHandshake`], the per-attempt
//!   state machine.
//!
//! Typical use, one instance per client attempt:
//!
//! ```no_run
//! # use tee3_handshake::*;
//! # fn run(keys: &InMemoryServerKeys, headers: &std::collections::HashMap<String, String>,
//! #        m1: &[u8], m3: &[u8]) -> Result<Tee3Context, TeeError> {
//! let mut hs = ServerTeeHandshake::new(keys, HandshakeConfig::default());
//! hs.generate_and_set_vau_cid(headers)?;
//! let _m2 = hs.create_message2(m1)?;
//! let _m4 = hs.create_message4(m3)?;
//! hs.context()
//! # }
//! ```
pub mod adapters;
pub mod application;
pub mod core;
pub mod domain;
pub mod ports;
pub mod protocol;
#[doc(hidden)]
pub mod test_support;

pub use adapters::crypto::AesGcmAead;
pub use adapters::keys::{InMemoryServerKeys, ServerKeysConfig};
pub use application::handshake::{HandshakeConfig, HandshakeState, ServerTeeHandshake};
pub use domain::handshake::{ChannelId, KeyId, Tee3Context, TeeError, VauCid};
pub use ports::{HandshakeAead, RequestHeaders, ServerKeys};
