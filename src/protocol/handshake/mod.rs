pub mod keyschedule;
pub mod transcript;
pub mod wire;
