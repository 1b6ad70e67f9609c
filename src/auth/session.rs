//! Unlock state for one running application.
//!
//! This replaces a process-wide flag: the session is an ordinary value the
//! application creates and hands to whatever needs it. Interested parties
//! subscribe and are woken on each change.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// Whether the journal has been unlocked with the PIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LockState {
    Locked,
    Unlocked,
}

/// Shared lock state. Clones observe and modify the same state.
///
/// # Example
///
/// ```
/// use daybook::auth::{AuthSession, LockState};
///
/// let session = AuthSession::new();
/// assert!(!session.is_unlocked());
///
/// let mut changes = session.subscribe();
/// session.unlock();
/// assert!(changes.has_changed().unwrap());
/// assert_eq!(*changes.borrow_and_update(), LockState::Unlocked);
/// ```
#[derive(Debug, Clone)]
pub struct AuthSession {
    state: Arc<watch::Sender<LockState>>,
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthSession {
    /// Creates a locked session.
    pub fn new() -> Self {
        let (state, _) = watch::channel(LockState::Locked);
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> LockState {
        *self.state.borrow()
    }

    pub fn is_unlocked(&self) -> bool {
        self.state() == LockState::Unlocked
    }

    /// Marks the session unlocked. Call only after the PIN has been verified.
    pub fn unlock(&self) {
        self.set(LockState::Unlocked);
    }

    /// Marks the session locked.
    pub fn lock(&self) {
        self.set(LockState::Locked);
    }

    /// Returns a receiver that is notified whenever the state changes.
    ///
    /// Setting the state it already has does not notify.
    pub fn subscribe(&self) -> watch::Receiver<LockState> {
        self.state.subscribe()
    }

    fn set(&self, next: LockState) {
        let changed = self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
        if changed {
            info!("Session is now {:?}", next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_initially_locked() {
        let session = AuthSession::new();
        assert_eq!(session.state(), LockState::Locked);
        assert!(!session.is_unlocked());
    }

    #[test]
    fn test_unlock_and_lock() {
        let session = AuthSession::new();
        session.unlock();
        assert!(session.is_unlocked());
        session.lock();
        assert!(!session.is_unlocked());
    }

    #[test]
    fn test_subscribers_see_changes() {
        let session = AuthSession::new();
        let mut first = session.subscribe();
        let mut second = session.subscribe();

        session.unlock();

        assert!(first.has_changed().unwrap());
        assert_eq!(*first.borrow_and_update(), LockState::Unlocked);
        assert_eq!(*second.borrow_and_update(), LockState::Unlocked);
        assert!(!first.has_changed().unwrap());
    }

    #[test]
    fn test_repeated_state_does_not_notify() {
        let session = AuthSession::new();
        let mut changes = session.subscribe();

        session.lock();
        assert!(!changes.has_changed().unwrap());

        session.unlock();
        changes.borrow_and_update();
        session.unlock();
        assert!(!changes.has_changed().unwrap());
    }

    #[test]
    fn test_clones_share_state() {
        let session = AuthSession::new();
        let handle = session.clone();
        handle.unlock();
        assert!(session.is_unlocked());
    }

    #[tokio::test]
    async fn test_subscriber_wakes_on_change() {
        let session = AuthSession::new();
        let mut changes = session.subscribe();

        let waiter = tokio::spawn(async move {
            changes.changed().await.unwrap();
            *changes.borrow()
        });
        session.unlock();

        assert_eq!(waiter.await.unwrap(), LockState::Unlocked);
    }
}
