use core::fmt;

use rand_core::CryptoRngCore;

use crate::domain::handshake::params::{CHANNEL_ID_LEN, VAU_CID_MAX_LEN, VAU_CID_PREFIX};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VauCidError {
    #[error("VAU-CID is empty")]
    Empty,
    #[error("VAU-CID must start with '/'")]
    MissingLeadingSlash,
    #[error("VAU-CID contains invalid character {0:?}")]
    InvalidCharacter(char),
    #[error("VAU-CID is {0} characters long, limit is {VAU_CID_MAX_LEN}")]
    TooLong(usize),
}

/// 32 random bytes identifying one channel, kept hex-encoded.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ChannelId(String);

impl ChannelId {
    /// Draw a fresh channel id.
    pub fn generate<R: CryptoRngCore>(rng: &mut R) -> Self {
        let mut raw = [0u8; CHANNEL_ID_LEN];
        rng.fill_bytes(&mut raw);
        Self(hex::encode(raw))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ChannelId({})", self.0)
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Routable channel identifier:
/// `/VAU/v1/<hex(cluster)>/<hex(pod)>/<channel id>`.
///
/// Only `[a-zA-Z0-9/-]`, leading `/`, at most 200 characters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct VauCid(String);

impl VauCid {
    /// Build the identifier for a channel from the router's cluster and pod
    /// addresses. Both addresses are hex-encoded, so any header value is
    /// representable; only the total length can fail validation.
    ///
    /// # Errors
    /// Returns `VauCidError::TooLong` for oversized addresses.
    pub fn build(
        cluster_address: &str,
        pod_address: &str,
        channel_id: &ChannelId,
    ) -> Result<Self, VauCidError> {
        Self::parse(format!(
            "{VAU_CID_PREFIX}{}/{}/{}",
            hex::encode(cluster_address.as_bytes()),
            hex::encode(pod_address.as_bytes()),
            channel_id.as_str()
        ))
    }

    /// Accept an existing identifier after validating it.
    ///
    /// # Errors
    /// Returns the first rule the value violates.
    pub fn parse(value: impl Into<String>) -> Result<Self, VauCidError> {
        let value = value.into();
        Self::verify(&value)?;
        Ok(Self(value))
    }

    fn verify(value: &str) -> Result<(), VauCidError> {
        if value.is_empty() {
            return Err(VauCidError::Empty);
        }
        if !value.starts_with('/') {
            return Err(VauCidError::MissingLeadingSlash);
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '/' || *c == '-'))
        {
            return Err(VauCidError::InvalidCharacter(bad));
        }
        if value.len() > VAU_CID_MAX_LEN {
            return Err(VauCidError::TooLong(value.len()));
        }
        Ok(())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VauCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VauCid({})", self.0)
    }
}

impl fmt::Display for VauCid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
