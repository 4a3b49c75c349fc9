pub mod handshake;

pub use handshake::{HandshakeConfig, HandshakeState, ServerTeeHandshake};
