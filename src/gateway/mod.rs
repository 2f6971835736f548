pub mod client;
pub mod signer;
pub mod types;
