//! Credential store
//!
//! Holds the single shared access credential. Loading, refreshing and
//! persisting happen behind one async mutex so two batches never refresh
//! concurrently and invalidate each other's refresh token.

use super::cipher::TokenCipher;
use crate::adapters::bluebeam::DocumentService;
use crate::adapters::database::ExportStore;
use crate::domain::{Credential, CredentialError, ExportError, RemoteError, Result};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Loads, refreshes and saves the process-wide credential
pub struct CredentialStore {
    store: Arc<dyn ExportStore>,
    service: Arc<dyn DocumentService>,
    cipher: TokenCipher,
    refresh_lock: Mutex<()>,
}

impl CredentialStore {
    pub fn new(
        store: Arc<dyn ExportStore>,
        service: Arc<dyn DocumentService>,
        cipher: TokenCipher,
    ) -> Self {
        Self {
            store,
            service,
            cipher,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Returns a usable credential, refreshing and persisting it if expired
    ///
    /// `Ok(None)` means nothing is stored and an operator has to authorize.
    ///
    /// # Errors
    ///
    /// Returns a credential error if the stored row is unreadable or the
    /// authorization server refuses the refresh.
    pub async fn get_valid_credential(&self) -> Result<Option<Credential>> {
        let _guard = self.refresh_lock.lock().await;

        let Some(encrypted) = self.store.load_token().await? else {
            return Ok(None);
        };
        let credential = self.cipher.decrypt(&encrypted)?;

        if !credential.is_expired() {
            return Ok(Some(credential));
        }

        tracing::info!(expired_at = %credential.expires_at, "Stored credential expired, refreshing");
        let refresh_token = credential
            .refresh_token
            .as_ref()
            .ok_or_else(|| CredentialError::Denied("credential has no refresh token".to_string()))?;

        let refreshed = self
            .service
            .refresh_credential(refresh_token.expose_secret().as_ref())
            .await
            .map_err(grant_error)?;

        self.persist(&refreshed).await?;
        Ok(Some(refreshed))
    }

    /// Like [`get_valid_credential`](Self::get_valid_credential) but absence is
    /// an error
    pub async fn require_credential(&self) -> Result<Credential> {
        self.get_valid_credential()
            .await?
            .ok_or_else(|| CredentialError::NotAuthorized.into())
    }

    /// Encrypt and store a credential, replacing any previous one
    pub async fn save_credential(&self, credential: &Credential) -> Result<()> {
        let _guard = self.refresh_lock.lock().await;
        self.persist(credential).await
    }

    /// Exchange an authorization code and store the resulting credential
    ///
    /// # Errors
    ///
    /// Returns [`CredentialError::Denied`] if the grant is refused.
    pub async fn authorize(&self, code: &str, redirect_uri: &str) -> Result<Credential> {
        let credential = self
            .service
            .exchange_code(code, redirect_uri)
            .await
            .map_err(grant_error)?;
        self.save_credential(&credential).await?;

        tracing::info!(
            user = credential.user_name.as_deref().unwrap_or("unknown"),
            "Stored new credential"
        );
        Ok(credential)
    }

    async fn persist(&self, credential: &Credential) -> Result<()> {
        let encrypted = self.cipher.encrypt(credential)?;
        self.store.save_token(&encrypted).await
    }
}

/// 4xx answers from the token endpoint are a refusal; anything else is a
/// remote failure
fn grant_error(err: RemoteError) -> ExportError {
    match err.status() {
        Some(status) if (400..500).contains(&status) => {
            CredentialError::Denied(err.to_string()).into()
        }
        _ => err.into(),
    }
}
