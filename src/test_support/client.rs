use rand_core::CryptoRngCore;

use crate::adapters::crypto::AesGcmAead;
use crate::application::handshake::primitives::{
    Encapsulation, aead_decrypt, aead_encrypt, decapsulate, encapsulate,
};
use crate::core::crypto::{HkdfError, generate_key_pairs};
use crate::domain::handshake::{
    KeyId, Message1, Message2, Message3, Message3InnerLayer, Message4, SignedPublicKeys, TeeError,
    VauKeys,
};
use crate::ports::crypto::{KeyPairs, PublicKeys, SymmetricKeys};
use crate::protocol::handshake::keyschedule::{K2Keys, combine, derive_k1, derive_k2};
use crate::protocol::handshake::transcript::{TRANSCRIPT_HASH_LEN, Transcript};
use crate::protocol::handshake::wire::{decode_as, decode_typed, encode_as};

fn key_schedule(e: HkdfError) -> TeeError {
    TeeError::InternalServerError(e.to_string())
}

/// Client half of the handshake, just enough to drive a server in tests.
pub struct ReferenceClient<R> {
    rng: R,
    key_pairs: KeyPairs,
    transcript: Transcript,
    signed: Option<SignedPublicKeys>,
    k2: Option<K2Keys>,
    /// Seal this instead of the real transcript hash in M3.
    pub claimed_transcript_hash: Option<[u8; TRANSCRIPT_HASH_LEN]>,
}

impl<R: CryptoRngCore> ReferenceClient<R> {
    pub fn new(mut rng: R) -> Self {
        let key_pairs = generate_key_pairs(&mut rng);
        Self {
            rng,
            key_pairs,
            transcript: Transcript::new(),
            signed: None,
            k2: None,
            claimed_transcript_hash: None,
        }
    }

    #[must_use]
    pub fn public_keys(&self) -> &PublicKeys {
        &self.key_pairs.public
    }

    /// # Errors
    /// Encoding failures.
    pub fn message1(&mut self) -> Result<Vec<u8>, TeeError> {
        let public = &self.key_pairs.public;
        let bytes = encode_as(
            &Message1::new(public.ecdh.clone(), public.kyber768.clone()),
            "M1",
        )?;
        self.transcript.append(&bytes);
        Ok(bytes)
    }

    /// Process M2 and answer with M3.
    ///
    /// # Errors
    /// Whatever step of M2 processing fails.
    pub fn message3(&mut self, serialized_m2: &[u8]) -> Result<Vec<u8>, TeeError> {
        let m2: Message2 = decode_typed(serialized_m2)?;
        let ephemeral = decapsulate(&m2.cipher_texts(), &self.key_pairs.private)?;
        let k1 = derive_k1(&ephemeral).map_err(key_schedule)?;

        let signed_bytes = aead_decrypt(
            &AesGcmAead,
            &k1.server_to_client,
            &m2.aead_cipher_text,
            "M2 signed public keys",
        )?;
        let signed: SignedPublicKeys = decode_as(&signed_bytes, "signed public keys")?;
        let server: VauKeys = decode_as(&signed.signed_pub_keys, "VauKeys")?;

        let Encapsulation {
            shared_keys: fixed,
            cipher_texts,
        } = encapsulate(
            &server.ecdh_public_key,
            &server.kyber768_public_key,
            &mut self.rng,
        )?;
        let inner = encode_as(&Message3InnerLayer::new(cipher_texts), "M3 inner layer")?;
        let aead_cipher_text =
            aead_encrypt(&AesGcmAead, &k1.client_to_server, &inner, &mut self.rng)?;

        let k2 = derive_k2(&combine(&ephemeral, &fixed)).map_err(key_schedule)?;
        self.transcript.append(serialized_m2);
        let hash = match self.claimed_transcript_hash {
            Some(forged) => forged,
            None => self.transcript.hash_with(&aead_cipher_text),
        };
        let confirmation = aead_encrypt(
            &AesGcmAead,
            &k2.key_confirmation.client_to_server,
            &hash,
            &mut self.rng,
        )?;
        let bytes = encode_as(&Message3::new(aead_cipher_text, confirmation), "M3")?;
        self.transcript.append(&bytes);
        self.signed = Some(signed);
        self.k2 = Some(k2);
        Ok(bytes)
    }

    /// Check the server's key confirmation in M4.
    ///
    /// # Errors
    /// `TransscriptError` if the server saw a different transcript.
    pub fn finish(&self, serialized_m4: &[u8]) -> Result<(), TeeError> {
        let m4: Message4 = decode_typed(serialized_m4)?;
        let k2 = self
            .k2
            .as_ref()
            .ok_or(TeeError::InvalidState("M3 has not been sent"))?;
        let claimed = aead_decrypt(
            &AesGcmAead,
            &k2.key_confirmation.server_to_client,
            &m4.aead_cipher_text_key_confirmation,
            "M4 key confirmation",
        )?;
        if claimed.as_slice() != self.transcript.hash().as_slice() {
            return Err(TeeError::TransscriptError(
                "server transcript hash does not match".into(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn signed_public_keys(&self) -> Option<&SignedPublicKeys> {
        self.signed.as_ref()
    }

    #[must_use]
    pub fn application_keys(&self) -> Option<&SymmetricKeys> {
        self.k2.as_ref().map(|k| &k.application_data)
    }

    #[must_use]
    pub fn key_id(&self) -> Option<KeyId> {
        self.k2.as_ref().map(|k| k.key_id)
    }
}
