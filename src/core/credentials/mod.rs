//! Access credential lifecycle
//!
//! - [`cipher`] - Fernet encryption of the stored credential
//! - [`store`] - Single-flight load, refresh and save

pub mod cipher;
pub mod store;

pub use cipher::TokenCipher;
pub use store::CredentialStore;
