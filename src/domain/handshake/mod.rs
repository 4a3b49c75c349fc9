/*
TEE3 handshake data model.

This module is the single source of truth for the wire schema of the
four-message handshake (`M1 -> M2 -> M3 -> M4`) and for the values the
handshake produces: `KeyId`, `VauCid` / `ChannelId` and `Tee3Context`.

Notes:
* Binary fields are CBOR byte strings ([`byte_buf`]).
* Length and curve checks are not done at decode time. The crypto layer
  validates peer keys explicitly so that a bad key always surfaces as
  `TeeError::FailedPublicKeyVerification`, never as a decode error.
* Secret key material lives in `ports::crypto`, not here.
*/

pub mod byte_buf;
pub mod context;
pub mod errors;
pub mod keys;
pub mod messages;
pub mod params;
pub mod vau_cid;

pub use context::Tee3Context;
pub use errors::TeeError;
pub use keys::*;
pub use messages::*;
pub use vau_cid::{ChannelId, VauCid, VauCidError};
