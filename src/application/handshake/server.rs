//! Server side of the TEE3 handshake.
//!
//! One [`ServerTeeHandshake`] serves exactly one client attempt:
//!
//! ```text
//! AwaitingM1 --create_message2--> AwaitingM3 --create_message4--> Complete --context--> ContextIssued
//!      \_______________________________\__________________________\___ any error ___> Failed
//! ```
//!
//! `generate_and_set_vau_cid` is orthogonal to that chain and may run once at
//! any point before the instance fails. A `Failed` instance is inert: every
//! later call returns `TeeError::InvalidState`, and the secrets of the state
//! it failed in have already been dropped (and wiped). The one error that
//! does not fail the instance is `context()` on a `Complete` handshake whose
//! VAU-CID is not set yet.
//!
//! Synchronous by construction: no call suspends, and one instance must not be
//! shared between threads without external exclusion.

use core::fmt;
use core::mem;

use rand_core::{CryptoRngCore, OsRng};
use subtle::ConstantTimeEq;
use tracing::{debug, error, warn};
use zeroize::Zeroizing;

use super::config::HandshakeConfig;
use super::primitives::{
    Encapsulation, aead_decrypt, aead_encrypt, decapsulate, encapsulate, verify_vau_keys,
};
use crate::adapters::crypto::AesGcmAead;
use crate::core::crypto::HkdfError;
use crate::domain::handshake::{
    ChannelId, KeyId, Message2, Message4, Tee3Context, TeeError, VauCid,
};
use crate::ports::crypto::{HandshakeAead, SharedKeys, SymmetricKeys};
use crate::ports::headers::RequestHeaders;
use crate::ports::server_keys::ServerKeys;
use crate::protocol::handshake::keyschedule::{self, K2Keys, derive_k1, derive_k2};
use crate::protocol::handshake::transcript::Transcript;
use crate::protocol::handshake::wire;

/// Coarse progress of a handshake, as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    AwaitingM1,
    AwaitingM3,
    Complete,
    ContextIssued,
    Failed,
}

/// What survives between M2 and M3.
struct AwaitingM3 {
    transcript: Transcript,
    ephemeral: SharedKeys,
    k1: SymmetricKeys,
}

/// What survives between M4 and `context()`.
struct Completed {
    application_data: SymmetricKeys,
    key_id: KeyId,
}

enum ServerState {
    AwaitingM1,
    AwaitingM3(Box<AwaitingM3>),
    Complete(Box<Completed>),
    ContextIssued,
    Failed,
}

impl ServerState {
    fn public(&self) -> HandshakeState {
        match self {
            Self::AwaitingM1 => HandshakeState::AwaitingM1,
            Self::AwaitingM3(_) => HandshakeState::AwaitingM3,
            Self::Complete(_) => HandshakeState::Complete,
            Self::ContextIssued => HandshakeState::ContextIssued,
            Self::Failed => HandshakeState::Failed,
        }
    }
}

fn key_schedule_error(e: HkdfError) -> TeeError {
    error!("key derivation failed: {e}");
    TeeError::InternalServerError("key derivation failed".into())
}

fn misuse(previous: &ServerState, what: &'static str) -> TeeError {
    error!(state = ?previous.public(), "{what}");
    TeeError::InvalidState(what)
}

/// Server half of one TEE3 handshake.
///
/// Generic over its collaborators so tests can pin the RNG and swap the
/// AEAD; production code uses [`ServerTeeHandshake::new`].
pub struct ServerTeeHandshake<K, A = AesGcmAead, R = OsRng> {
    keys: K,
    aead: A,
    rng: R,
    config: HandshakeConfig,
    state: ServerState,
    vau_cid: Option<VauCid>,
    channel_id: Option<ChannelId>,
}

impl<K, A, R> fmt::Debug for ServerTeeHandshake<K, A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerTeeHandshake")
            .field("state", &self.state.public())
            .field("vau_cid", &self.vau_cid)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<K: ServerKeys> ServerTeeHandshake<K> {
    /// AES-256-GCM and the operating system RNG.
    #[must_use]
    pub fn new(keys: K, config: HandshakeConfig) -> Self {
        Self::with_parts(keys, config, AesGcmAead, OsRng)
    }
}

impl<K: ServerKeys, A: HandshakeAead, R: CryptoRngCore> ServerTeeHandshake<K, A, R> {
    #[must_use]
    pub fn with_parts(keys: K, config: HandshakeConfig, aead: A, rng: R) -> Self {
        Self {
            keys,
            aead,
            rng,
            config,
            state: ServerState::AwaitingM1,
            vau_cid: None,
            channel_id: None,
        }
    }

    #[must_use]
    pub fn state(&self) -> HandshakeState {
        self.state.public()
    }

    #[must_use]
    pub fn config(&self) -> &HandshakeConfig {
        &self.config
    }

    #[must_use]
    pub fn vau_cid(&self) -> Option<&VauCid> {
        self.vau_cid.as_ref()
    }

    #[must_use]
    pub fn channel_id(&self) -> Option<&ChannelId> {
        self.channel_id.as_ref()
    }

    /// Build and store this channel's VAU-CID from the router headers.
    ///
    /// # Errors
    /// * `TeeError::MissingParameters` if either address header is absent.
    /// * `TeeError::InternalServerError` if the result is not a valid VAU-CID.
    /// * `TeeError::InvalidState` on a second call or on a failed instance.
    pub fn generate_and_set_vau_cid<H: RequestHeaders + ?Sized>(
        &mut self,
        headers: &H,
    ) -> Result<&VauCid, TeeError> {
        if matches!(self.state, ServerState::Failed) {
            return Err(misuse(&self.state, "handshake has already failed"));
        }
        if self.vau_cid.is_some() {
            let previous = mem::replace(&mut self.state, ServerState::Failed);
            return Err(misuse(&previous, "VAU-CID is already set"));
        }
        match self.build_vau_cid(headers) {
            Ok((vau_cid, channel_id)) => {
                debug!(%vau_cid, "VAU-CID assigned");
                self.channel_id = Some(channel_id);
                Ok(&*self.vau_cid.insert(vau_cid))
            }
            Err(e) => {
                self.state = ServerState::Failed;
                Err(e)
            }
        }
    }

    fn build_vau_cid<H: RequestHeaders + ?Sized>(
        &mut self,
        headers: &H,
    ) -> Result<(VauCid, ChannelId), TeeError> {
        let lookup = |name: &str| {
            headers.header(name).ok_or_else(|| {
                warn!(header = name, "required request header missing");
                TeeError::MissingParameters(format!("header {name}"))
            })
        };
        let cluster = lookup(&self.config.cluster_address_header)?;
        let pod = lookup(&self.config.pod_address_header)?;
        let channel_id = ChannelId::generate(&mut self.rng);
        let vau_cid = VauCid::build(cluster, pod, &channel_id).map_err(|e| {
            error!("VAU-CID rejected: {e}");
            TeeError::InternalServerError(e.to_string())
        })?;
        Ok((vau_cid, channel_id))
    }

    /// Consume M1 and produce M2.
    ///
    /// # Errors
    /// * `MissingParameters` / `DecodingError` / `InternalServerError` for an
    ///   undecodable M1.
    /// * `FailedPublicKeyVerification` if the client's keys are invalid.
    /// * `InternalServerError` if the static keys are unavailable.
    /// * `InvalidState` unless this is the first handshake call.
    pub fn create_message2(&mut self, serialized_m1: &[u8]) -> Result<Vec<u8>, TeeError> {
        match mem::replace(&mut self.state, ServerState::Failed) {
            ServerState::AwaitingM1 => {}
            previous => return Err(misuse(&previous, "create_message2 expects state AwaitingM1")),
        }
        let (serialized_m2, next) = self.message2(serialized_m1)?;
        self.state = next;
        Ok(serialized_m2)
    }

    fn message2(&mut self, serialized_m1: &[u8]) -> Result<(Vec<u8>, ServerState), TeeError> {
        let m1 = wire::decode_message1(serialized_m1)?;
        verify_vau_keys(&m1.ecdh_public_key, &m1.kyber768_public_key)?;

        let Encapsulation {
            shared_keys,
            cipher_texts,
        } = encapsulate(&m1.ecdh_public_key, &m1.kyber768_public_key, &mut self.rng)?;
        let k1 = derive_k1(&shared_keys).map_err(key_schedule_error)?;

        let signed = wire::encode_signed_public_keys(&self.keys.signed_public_keys()?)?;
        let aead_cipher_text =
            aead_encrypt(&self.aead, &k1.server_to_client, &signed, &mut self.rng)?;
        let serialized_m2 = wire::encode_message2(&Message2::new(cipher_texts, aead_cipher_text))?;

        debug!(m1 = serialized_m1.len(), m2 = serialized_m2.len(), "M2 created");
        let next = ServerState::AwaitingM3(Box::new(AwaitingM3 {
            transcript: Transcript::from_messages(serialized_m1, &serialized_m2),
            ephemeral: shared_keys,
            k1,
        }));
        Ok((serialized_m2, next))
    }

    /// Consume M3, confirm the client's transcript and produce M4.
    ///
    /// # Errors
    /// * Decode errors as for [`Self::create_message2`].
    /// * `GcmDecryptionFailure` if either M3 blob does not open.
    /// * `FailedPublicKeyVerification` for an invalid ECDH ciphertext.
    /// * `TransscriptError` if the client's transcript hash differs.
    /// * `InvalidState` unless M2 has been created.
    pub fn create_message4(&mut self, serialized_m3: &[u8]) -> Result<Vec<u8>, TeeError> {
        let awaiting = match mem::replace(&mut self.state, ServerState::Failed) {
            ServerState::AwaitingM3(awaiting) => awaiting,
            previous => return Err(misuse(&previous, "create_message4 expects state AwaitingM3")),
        };
        let (serialized_m4, next) = self.message4(*awaiting, serialized_m3)?;
        self.state = next;
        Ok(serialized_m4)
    }

    fn message4(
        &mut self,
        awaiting: AwaitingM3,
        serialized_m3: &[u8],
    ) -> Result<(Vec<u8>, ServerState), TeeError> {
        let AwaitingM3 {
            mut transcript,
            ephemeral,
            k1,
        } = awaiting;

        let m3 = wire::decode_message3(serialized_m3)?;
        let inner = Zeroizing::new(aead_decrypt(
            &self.aead,
            &k1.client_to_server,
            &m3.aead_cipher_text,
            "M3 inner layer",
        )?);
        let inner = wire::decode_message3_inner(&inner)?;
        if inner.erp || inner.eso {
            debug!(erp = inner.erp, eso = inner.eso, "client flags");
        }

        let fixed = decapsulate(&inner.cipher_texts(), self.keys.private_keys()?)?;
        let combined = keyschedule::combine(&ephemeral, &fixed);
        let K2Keys {
            key_confirmation,
            application_data,
            key_id,
        } = derive_k2(&combined).map_err(key_schedule_error)?;

        let computed = transcript.hash_with(&m3.aead_cipher_text);
        let claimed = aead_decrypt(
            &self.aead,
            &key_confirmation.client_to_server,
            &m3.aead_cipher_text_key_confirmation,
            "M3 key confirmation",
        )?;
        if !bool::from(claimed.as_slice().ct_eq(computed.as_slice())) {
            error!("client transcript hash does not match");
            return Err(TeeError::TransscriptError(
                "client transcript hash does not match".into(),
            ));
        }

        transcript.append(serialized_m3);
        let confirmation = aead_encrypt(
            &self.aead,
            &key_confirmation.server_to_client,
            &transcript.hash(),
            &mut self.rng,
        )?;
        let serialized_m4 = wire::encode_message4(&Message4::new(confirmation))?;

        debug!(
            key_id = %key_id.to_hex(),
            vau_cid = ?self.vau_cid,
            "TEE3 handshake complete"
        );
        let next = ServerState::Complete(Box::new(Completed {
            application_data,
            key_id,
        }));
        Ok((serialized_m4, next))
    }

    /// Hand the negotiated keys and channel identity to the caller. The
    /// instance is inert afterwards.
    ///
    /// Asking before the VAU-CID is set is refused without touching the
    /// state: the instance stays `Complete`, so the caller can set the
    /// VAU-CID and ask again.
    ///
    /// # Errors
    /// `TeeError::InvalidState` unless M4 has been created and the VAU-CID
    /// is set.
    pub fn context(&mut self) -> Result<Tee3Context, TeeError> {
        let identity = self.vau_cid.clone().zip(self.channel_id.clone());
        let (completed, (vau_cid, channel_id)) =
            match (mem::replace(&mut self.state, ServerState::Failed), identity) {
                (ServerState::Complete(completed), Some(identity)) => (completed, identity),
                (ServerState::Complete(completed), None) => {
                    warn!("context requested before the VAU-CID was set");
                    self.state = ServerState::Complete(completed);
                    return Err(TeeError::InvalidState("context requires a VAU-CID"));
                }
                (previous, _) => return Err(misuse(&previous, "context expects state Complete")),
            };
        self.state = ServerState::ContextIssued;
        let Completed {
            application_data,
            key_id,
        } = *completed;
        Ok(Tee3Context::new(
            application_data,
            key_id,
            vau_cid,
            channel_id,
            self.config.is_pu,
        ))
    }
}
