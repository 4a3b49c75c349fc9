pub mod aes256gcm;

pub use aes256gcm::AesGcmAead;
