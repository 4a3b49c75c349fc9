use std::time::{Duration, SystemTime};

use p256::ecdsa::signature::Verifier;
use p256::ecdsa::{Signature, SigningKey};
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRngCore, SeedableRng};

use super::*;
use crate::adapters::crypto::AesGcmAead;
use crate::adapters::keys::{InMemoryServerKeys, ServerKeysConfig};
use crate::core::cbor::{from_cbor, to_cbor};
use crate::core::crypto::generate_key_pairs;
use crate::domain::handshake::{Message3, TeeError};
use crate::ports::crypto::{AeadError, AeadKey, HandshakeAead};
use crate::protocol::handshake::wire;
use crate::test_support::{ReferenceClient, TEST_CERTIFICATE, mk_headers, mk_server_keys};

type TestServer<'k, A = AesGcmAead> = ServerTeeHandshake<&'k InMemoryServerKeys, A, ChaCha20Rng>;

fn server_keys(seed: u64) -> (SigningKey, InMemoryServerKeys) {
    mk_server_keys(&mut ChaCha20Rng::seed_from_u64(seed)).unwrap()
}

fn server(keys: &InMemoryServerKeys, seed: u64) -> TestServer<'_> {
    ServerTeeHandshake::with_parts(
        keys,
        HandshakeConfig::default(),
        AesGcmAead,
        ChaCha20Rng::seed_from_u64(seed),
    )
}

fn client(seed: u64) -> ReferenceClient<ChaCha20Rng> {
    ReferenceClient::new(ChaCha20Rng::seed_from_u64(seed))
}

/// Runs M1..M3 and returns the server plus the serialized M3.
fn up_to_m3<'k>(
    keys: &'k InMemoryServerKeys,
    client: &mut ReferenceClient<ChaCha20Rng>,
) -> (TestServer<'k>, Vec<u8>) {
    let mut srv = server(keys, 100);
    srv.generate_and_set_vau_cid(&mk_headers("cluster-a", "pod-7"))
        .unwrap();
    let m1 = client.message1().unwrap();
    let m2 = srv.create_message2(&m1).unwrap();
    assert_eq!(srv.state(), HandshakeState::AwaitingM3);
    let m3 = client.message3(&m2).unwrap();
    (srv, m3)
}

fn rewrite_m3(bytes: &[u8], edit: impl FnOnce(&mut Message3)) -> Vec<u8> {
    let mut m3: Message3 = from_cbor(bytes).unwrap();
    edit(&mut m3);
    to_cbor(&m3).unwrap()
}

// ---------------- Agreement ----------------

#[test]
fn full_handshake_agrees_with_client() {
    let (_, keys) = server_keys(1);
    let mut cl = client(2);
    let (mut srv, m3) = up_to_m3(&keys, &mut cl);

    let m4 = srv.create_message4(&m3).unwrap();
    assert_eq!(srv.state(), HandshakeState::Complete);
    cl.finish(&m4).unwrap();

    let ctx = srv.context().unwrap();
    assert_eq!(srv.state(), HandshakeState::ContextIssued);
    assert_eq!(Some(ctx.application_data()), cl.application_keys());
    assert_eq!(Some(*ctx.key_id()), cl.key_id());
    assert_ne!(
        ctx.application_data().client_to_server,
        ctx.application_data().server_to_client
    );
    assert!(!ctx.is_pu());

    let cid = ctx.vau_cid().as_str();
    assert!(cid.starts_with("/VAU/v1/"));
    assert!(cid.ends_with(ctx.channel_id().as_str()));
    assert_eq!(Some(ctx.vau_cid()), srv.vau_cid());
}

#[test]
fn client_receives_verifiable_signed_keys() {
    let (signer, keys) = server_keys(3);
    let mut cl = client(4);
    let _ = up_to_m3(&keys, &mut cl);

    let spk = cl.signed_public_keys().unwrap();
    let sig = Signature::from_slice(&spk.signature_es256).unwrap();
    signer
        .verifying_key()
        .verify(&spk.signed_pub_keys, &sig)
        .unwrap();
}

#[test]
fn production_flag_reaches_context() {
    let (_, keys) = server_keys(5);
    let mut cl = client(6);
    let mut srv: TestServer<'_> = ServerTeeHandshake::with_parts(
        &keys,
        HandshakeConfig::production(),
        AesGcmAead,
        ChaCha20Rng::seed_from_u64(7),
    );
    srv.generate_and_set_vau_cid(&mk_headers("c", "p")).unwrap();
    let m2 = srv.create_message2(&cl.message1().unwrap()).unwrap();
    let m3 = cl.message3(&m2).unwrap();
    srv.create_message4(&m3).unwrap();
    assert!(srv.context().unwrap().is_pu());
}

#[test]
fn same_seed_same_keys_same_m2() {
    let (_, keys) = server_keys(8);
    let m1 = client(9).message1().unwrap();
    let a = server(&keys, 10).create_message2(&m1).unwrap();
    let b = server(&keys, 10).create_message2(&m1).unwrap();
    let c = server(&keys, 11).create_message2(&m1).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

// ---------------- Tamper detection ----------------

#[test]
fn flipped_key_confirmation_bit_fails_decryption() {
    let (_, keys) = server_keys(12);
    let mut cl = client(13);
    let (mut srv, m3) = up_to_m3(&keys, &mut cl);
    let m3 = rewrite_m3(&m3, |m| m.aead_cipher_text_key_confirmation[20] ^= 0x04);

    assert_eq!(
        srv.create_message4(&m3).unwrap_err(),
        TeeError::GcmDecryptionFailure("M3 key confirmation".into())
    );
    assert_eq!(srv.state(), HandshakeState::Failed);
}

#[test]
fn flipped_inner_layer_bit_fails_decryption() {
    let (_, keys) = server_keys(14);
    let mut cl = client(15);
    let (mut srv, m3) = up_to_m3(&keys, &mut cl);
    let m3 = rewrite_m3(&m3, |m| m.aead_cipher_text[40] ^= 0x01);

    assert_eq!(
        srv.create_message4(&m3).unwrap_err(),
        TeeError::GcmDecryptionFailure("M3 inner layer".into())
    );
}

#[test]
fn forged_transcript_hash_is_a_transcript_error() {
    let (_, keys) = server_keys(16);
    let mut cl = client(17);
    cl.claimed_transcript_hash = Some([0x5A; 32]);
    let (mut srv, m3) = up_to_m3(&keys, &mut cl);

    assert!(matches!(
        srv.create_message4(&m3),
        Err(TeeError::TransscriptError(_))
    ));
    assert_eq!(srv.state(), HandshakeState::Failed);
    assert!(matches!(srv.context(), Err(TeeError::InvalidState(_))));
}

/// Same M1 content, map entries in reverse order.
fn reorder_map_entries(bytes: &[u8]) -> Vec<u8> {
    let value: ciborium::Value = ciborium::de::from_reader(bytes).unwrap();
    let ciborium::Value::Map(mut entries) = value else {
        panic!("expected a CBOR map");
    };
    entries.reverse();
    let mut out = Vec::new();
    ciborium::ser::into_writer(&ciborium::Value::Map(entries), &mut out).unwrap();
    out
}

#[test]
fn reencoded_m1_breaks_the_transcript() {
    let (_, keys) = server_keys(50);
    let mut cl = client(51);
    let mut srv = server(&keys, 52);
    let m1 = cl.message1().unwrap();
    let reordered = reorder_map_entries(&m1);
    assert_ne!(reordered, m1);
    assert_eq!(
        wire::decode_message1(&reordered).unwrap(),
        wire::decode_message1(&m1).unwrap()
    );

    let m2 = srv.create_message2(&reordered).unwrap();
    let m3 = cl.message3(&m2).unwrap();
    assert!(matches!(
        srv.create_message4(&m3),
        Err(TeeError::TransscriptError(_))
    ));
    assert_eq!(srv.state(), HandshakeState::Failed);
}

#[test]
fn m3_from_another_session_is_rejected() {
    let (_, keys) = server_keys(18);
    let mut first = client(19);
    let mut second = client(20);
    let (mut srv, _) = up_to_m3(&keys, &mut first);
    let (_, foreign_m3) = up_to_m3(&keys, &mut second);

    assert!(matches!(
        srv.create_message4(&foreign_m3),
        Err(TeeError::GcmDecryptionFailure(_))
    ));
}

// ---------------- VAU-CID ----------------

#[test]
fn second_vau_cid_call_is_rejected_and_first_kept() {
    let (_, keys) = server_keys(21);
    let mut srv = server(&keys, 22);
    let first = srv
        .generate_and_set_vau_cid(&mk_headers("a", "b"))
        .unwrap()
        .clone();
    let channel = srv.channel_id().cloned();

    assert!(matches!(
        srv.generate_and_set_vau_cid(&mk_headers("x", "y")),
        Err(TeeError::InvalidState(_))
    ));
    assert_eq!(srv.vau_cid(), Some(&first));
    assert_eq!(srv.channel_id().cloned(), channel);
    assert_eq!(srv.state(), HandshakeState::Failed);
}

#[test]
fn missing_header_is_missing_parameters() {
    let (_, keys) = server_keys(23);
    let mut srv = server(&keys, 24);
    let mut headers = mk_headers("a", "b");
    headers.remove(POD_ADDRESS_HEADER);

    assert!(matches!(
        srv.generate_and_set_vau_cid(&headers),
        Err(TeeError::MissingParameters(_))
    ));
    assert!(srv.vau_cid().is_none());
    assert_eq!(srv.state(), HandshakeState::Failed);
}

#[test]
fn custom_header_names_and_slices_are_honoured() {
    let (_, keys) = server_keys(25);
    let config = HandshakeConfig {
        cluster_address_header: "X-Cluster".into(),
        pod_address_header: "X-Pod".into(),
        ..HandshakeConfig::default()
    };
    let mut srv: TestServer<'_> =
        ServerTeeHandshake::with_parts(&keys, config, AesGcmAead, ChaCha20Rng::seed_from_u64(26));
    let headers: &[(&str, &str)] = &[("x-cluster", "c1"), ("x-pod", "p1")];
    let cid = srv.generate_and_set_vau_cid(headers).unwrap();
    assert!(cid.as_str().starts_with(&format!(
        "/VAU/v1/{}/{}/",
        hex::encode("c1"),
        hex::encode("p1")
    )));
}

#[test]
fn oversized_headers_fail_validation() {
    let (_, keys) = server_keys(27);
    let mut srv = server(&keys, 28);
    let long = "c".repeat(100);
    assert!(matches!(
        srv.generate_and_set_vau_cid(&mk_headers(&long, "p")),
        Err(TeeError::InternalServerError(_))
    ));
}

// ---------------- Ordering ----------------

#[test]
fn operations_out_of_order_are_invalid_state() {
    let (_, keys) = server_keys(29);

    let mut srv = server(&keys, 30);
    assert!(matches!(
        srv.create_message4(b"anything"),
        Err(TeeError::InvalidState(_))
    ));
    assert_eq!(srv.state(), HandshakeState::Failed);

    let mut srv = server(&keys, 31);
    assert!(matches!(srv.context(), Err(TeeError::InvalidState(_))));

    let mut srv = server(&keys, 32);
    let m1 = client(33).message1().unwrap();
    srv.create_message2(&m1).unwrap();
    assert!(matches!(
        srv.create_message2(&m1),
        Err(TeeError::InvalidState(_))
    ));
}

#[test]
fn context_requires_vau_cid() {
    let (_, keys) = server_keys(34);
    let mut cl = client(35);
    let mut srv = server(&keys, 36);
    let m2 = srv.create_message2(&cl.message1().unwrap()).unwrap();
    let m4 = srv.create_message4(&cl.message3(&m2).unwrap()).unwrap();
    cl.finish(&m4).unwrap();

    assert!(matches!(srv.context(), Err(TeeError::InvalidState(_))));
    assert_eq!(srv.state(), HandshakeState::Complete);

    srv.generate_and_set_vau_cid(&mk_headers("late", "pod")).unwrap();
    let ctx = srv.context().unwrap();
    assert_eq!(Some(ctx.application_data()), cl.application_keys());
    assert_eq!(Some(ctx.vau_cid()), srv.vau_cid());
    assert_eq!(srv.state(), HandshakeState::ContextIssued);
}

#[test]
fn context_is_issued_once() {
    let (_, keys) = server_keys(37);
    let mut cl = client(38);
    let (mut srv, m3) = up_to_m3(&keys, &mut cl);
    srv.create_message4(&m3).unwrap();
    srv.context().unwrap();
    assert!(matches!(srv.context(), Err(TeeError::InvalidState(_))));
}

#[test]
fn failed_instance_is_inert() {
    let (_, keys) = server_keys(39);
    let mut srv = server(&keys, 40);
    assert!(matches!(
        srv.create_message2(&[0x01]),
        Err(TeeError::DecodingError(_))
    ));
    assert_eq!(srv.state(), HandshakeState::Failed);

    let m1 = client(41).message1().unwrap();
    assert!(matches!(
        srv.create_message2(&m1),
        Err(TeeError::InvalidState(_))
    ));
    assert!(matches!(
        srv.generate_and_set_vau_cid(&mk_headers("a", "b")),
        Err(TeeError::InvalidState(_))
    ));
}

// ---------------- Collaborator failures ----------------

#[derive(Clone, Copy, Default)]
struct FailingSeal;

impl HandshakeAead for FailingSeal {
    fn seal<R: CryptoRngCore>(
        &self,
        _key: &AeadKey,
        _plaintext: &[u8],
        _rng: &mut R,
    ) -> Result<Vec<u8>, AeadError> {
        Err(AeadError::Internal)
    }

    fn open(&self, key: &AeadKey, blob: &[u8]) -> Result<Vec<u8>, AeadError> {
        AesGcmAead.open(key, blob)
    }
}

#[test]
fn sealing_failure_is_internal() {
    let (_, keys) = server_keys(42);
    let mut srv: TestServer<'_, FailingSeal> = ServerTeeHandshake::with_parts(
        &keys,
        HandshakeConfig::default(),
        FailingSeal,
        ChaCha20Rng::seed_from_u64(43),
    );
    let m1 = client(44).message1().unwrap();
    assert!(matches!(
        srv.create_message2(&m1),
        Err(TeeError::InternalServerError(_))
    ));
}

fn keys_aged(days: u64, seed: u64) -> InMemoryServerKeys {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    let signer = SigningKey::random(&mut rng);
    InMemoryServerKeys::from_key_pairs(
        generate_key_pairs(&mut rng),
        &signer,
        TEST_CERTIFICATE,
        ServerKeysConfig::default(),
        SystemTime::now() - Duration::from_secs(days * 24 * 60 * 60),
    )
    .unwrap()
}

#[test]
fn keys_past_max_age_are_internal() {
    let keys = keys_aged(31, 45);
    let mut srv = server(&keys, 46);
    let m1 = client(47).message1().unwrap();
    assert!(matches!(
        srv.create_message2(&m1),
        Err(TeeError::InternalServerError(_))
    ));
    assert_eq!(srv.state(), HandshakeState::Failed);
}

#[test]
fn keys_past_bundle_exp_still_complete_a_handshake() {
    let keys = keys_aged(10, 53);
    let mut cl = client(54);
    let (mut srv, m3) = up_to_m3(&keys, &mut cl);
    let m4 = srv.create_message4(&m3).unwrap();
    cl.finish(&m4).unwrap();
    assert_eq!(Some(*srv.context().unwrap().key_id()), cl.key_id());
}

#[test]
fn debug_output_has_no_key_material() {
    let (_, keys) = server_keys(48);
    let mut cl = client(49);
    let (srv, _) = up_to_m3(&keys, &mut cl);
    let shown = format!("{srv:?}");
    assert!(shown.contains("AwaitingM3"));
    assert!(shown.contains("/VAU/v1/"));
}
