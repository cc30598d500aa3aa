//! Symmetric encryption of the stored credential
//!
//! Uses Fernet tokens. Besides the stored form written here, a row may hold
//! the raw token-endpoint response as the previous service stored it.

use crate::config::SecretString;
use crate::domain::{Credential, CredentialError, StoredCredential, TokenResponse};
use chrono::Utc;
use secrecy::ExposeSecret;

/// Encrypts and decrypts the serialized credential
#[derive(Clone)]
pub struct TokenCipher {
    fernet: fernet::Fernet,
}

impl TokenCipher {
    /// Create a cipher from a url-safe base64 Fernet key
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::InvalidKey`] if the key is malformed.
    pub fn new(key: &SecretString) -> Result<Self, CredentialError> {
        let key = key.expose_secret();
        let fernet = fernet::Fernet::new(key.as_ref()).ok_or(CredentialError::InvalidKey)?;
        Ok(Self { fernet })
    }

    pub fn encrypt(&self, credential: &Credential) -> Result<Vec<u8>, CredentialError> {
        let plain = serde_json::to_vec(&credential.to_stored())
            .map_err(|e| CredentialError::Corrupt(e.to_string()))?;
        Ok(self.fernet.encrypt(&plain).into_bytes())
    }

    pub fn decrypt(&self, encrypted: &[u8]) -> Result<Credential, CredentialError> {
        let token = std::str::from_utf8(encrypted)
            .map_err(|_| CredentialError::Corrupt("token is not valid UTF-8".to_string()))?;
        let plain = self
            .fernet
            .decrypt(token)
            .map_err(|_| CredentialError::Corrupt("decryption failed".to_string()))?;
        match serde_json::from_slice::<StoredCredential>(&plain) {
            Ok(stored) => Ok(stored.into()),
            Err(e) => {
                let mut legacy: TokenResponse = serde_json::from_slice(&plain)
                    .map_err(|_| CredentialError::Corrupt(e.to_string()))?;
                // A relative lifetime says nothing about when it was issued
                legacy.expires_in = None;
                tracing::debug!("Read credential stored as a raw token response");
                Ok(Credential::from_token_response(legacy, Utc::now()))
            }
        }
    }
}
