//! PIN setup and unlocking.

use crate::auth::{AuthSession, PinVerifier};
use crate::errors::{AppResult, AuthError, StorageError};
use crate::ops::Journal;
use std::sync::Arc;
use tracing::{info, warn};

/// Ties the stored credential, a [`PinVerifier`] and an [`AuthSession`]
/// together.
#[derive(Clone)]
pub struct Unlocker {
    journal: Journal,
    verifier: Arc<dyn PinVerifier>,
    session: AuthSession,
}

impl Unlocker {
    pub fn new(journal: Journal, verifier: Arc<dyn PinVerifier>, session: AuthSession) -> Self {
        Self {
            journal,
            verifier,
            session,
        }
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    /// Returns true if a PIN has been configured.
    pub async fn has_pin(&self) -> AppResult<bool> {
        Ok(self.journal.get_user().await?.is_some())
    }

    /// Hashes and stores the first PIN, then unlocks the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmptyPin` for an empty PIN and
    /// `AuthError::AlreadyConfigured` if a PIN exists.
    pub async fn setup_pin(&self, pin: &str) -> AppResult<()> {
        let verifier = Arc::clone(&self.verifier);
        let pin = pin.to_string();
        let hash = tokio::task::spawn_blocking(move || verifier.hash_pin(&pin))
            .await
            .map_err(StorageError::Task)??;

        self.journal.save_user(hash).await?;
        self.session.unlock();
        info!("PIN configured");
        Ok(())
    }

    /// Checks `pin` against the stored credential and unlocks on a match.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotConfigured` if no PIN exists and
    /// `AuthError::InvalidPin` on a mismatch; the session stays locked.
    pub async fn unlock(&self, pin: &str) -> AppResult<()> {
        let user = self
            .journal
            .get_user()
            .await?
            .ok_or(AuthError::NotConfigured)?;

        let verifier = Arc::clone(&self.verifier);
        let candidate = pin.to_string();
        let matches =
            tokio::task::spawn_blocking(move || verifier.verify_pin(&candidate, &user.pin_hash))
                .await
                .map_err(StorageError::Task)?;

        if !matches {
            warn!("Rejected unlock attempt");
            return Err(AuthError::InvalidPin.into());
        }

        self.session.unlock();
        Ok(())
    }

    pub fn lock(&self) {
        self.session.lock();
    }

    /// Removes the stored PIN and locks the session. Entries are kept.
    pub async fn reset_pin(&self) -> AppResult<bool> {
        let removed = self.journal.clear_users().await?;
        self.session.lock();
        Ok(removed)
    }
}
