pub mod crypto;
pub mod headers;
pub mod server_keys;

pub use crypto::*;
pub use headers::RequestHeaders;
pub use server_keys::ServerKeys;
