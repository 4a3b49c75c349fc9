// Fixed sizes of the TEE3 wire values.

/// Curve name carried in every `EcdhPublicKey`.
pub const ECDH_CURVE: &str = "P-256";
/// Length of one affine P-256 coordinate.
pub const ECDH_COORDINATE_LEN: usize = 32;

pub const KYBER768_PUBLIC_KEY_LEN: usize = 1184;
pub const KYBER768_PRIVATE_KEY_LEN: usize = 2400;
pub const KYBER768_CIPHERTEXT_LEN: usize = 1088;

/// Length of the KeyId produced by the K2 derivation.
pub const KEY_ID_LEN: usize = 32;
/// Random bytes behind a ChannelId (hex-encoded on the wire).
pub const CHANNEL_ID_LEN: usize = 32;
/// Upper bound for a VauCid string (gematik A_24608).
pub const VAU_CID_MAX_LEN: usize = 200;
/// Fixed prefix of every VauCid.
pub const VAU_CID_PREFIX: &str = "/VAU/v1/";
