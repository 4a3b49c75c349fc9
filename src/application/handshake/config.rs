//! Per-deployment settings for [`super::ServerTeeHandshake`].

/// Header carrying the router's cluster address.
pub const CLUSTER_ADDRESS_HEADER: &str = "IBM-EPA-tee-cluster-address";
/// Header carrying the router's pod address.
pub const POD_ADDRESS_HEADER: &str = "IBM-EPA-tee-pod-address";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandshakeConfig {
    /// Production (PU) deployment; copied into every `Tee3Context`.
    pub is_pu: bool,
    pub cluster_address_header: String,
    pub pod_address_header: String,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        Self {
            is_pu: false,
            cluster_address_header: CLUSTER_ADDRESS_HEADER.to_owned(),
            pod_address_header: POD_ADDRESS_HEADER.to_owned(),
        }
    }
}

impl HandshakeConfig {
    #[must_use]
    pub fn production() -> Self {
        Self {
            is_pu: true,
            ..Self::default()
        }
    }
}
