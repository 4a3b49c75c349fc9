pub mod config;
pub mod primitives;
pub mod server;
#[cfg(test)]
mod server_tests;

pub use config::{CLUSTER_ADDRESS_HEADER, HandshakeConfig, POD_ADDRESS_HEADER};
pub use primitives::Encapsulation;
pub use server::{HandshakeState, ServerTeeHandshake};
