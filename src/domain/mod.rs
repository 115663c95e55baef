pub mod blob;
pub mod certificate;
pub mod constants;
pub mod crypto;
pub mod search;
pub mod types;
