use crate::domain::handshake::keys::KeyId;
use crate::domain::handshake::vau_cid::{ChannelId, VauCid};
use crate::ports::crypto::SymmetricKeys;

/// Everything a finished handshake hands over to the channel layer.
///
/// The handshake instance is inert once this has been produced; the context
/// is the sole owner of the application-data keys from then on. It moves,
/// it is never copied:
///
/// ```compile_fail
/// fn duplicate<T: Clone>(_: &T) {}
/// fn check(ctx: &tee3_handshake::Tee3Context) {
///     duplicate(ctx);
/// }
/// ```
#[derive(Debug)]
pub struct Tee3Context {
    application_data: SymmetricKeys,
    key_id: KeyId,
    vau_cid: VauCid,
    channel_id: ChannelId,
    is_pu: bool,
}

impl Tee3Context {
    #[must_use]
    pub fn new(
        application_data: SymmetricKeys,
        key_id: KeyId,
        vau_cid: VauCid,
        channel_id: ChannelId,
        is_pu: bool,
    ) -> Self {
        Self {
            application_data,
            key_id,
            vau_cid,
            channel_id,
            is_pu,
        }
    }

    /// K2 application-data keys.
    #[must_use]
    pub fn application_data(&self) -> &SymmetricKeys {
        &self.application_data
    }

    #[must_use]
    pub fn key_id(&self) -> &KeyId {
        &self.key_id
    }

    #[must_use]
    pub fn vau_cid(&self) -> &VauCid {
        &self.vau_cid
    }

    #[must_use]
    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Production (PU) deployment.
    #[must_use]
    pub fn is_pu(&self) -> bool {
        self.is_pu
    }
}
