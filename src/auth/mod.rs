//! PIN verification and unlock state.
//!
//! The journal core never hashes or compares PINs itself. It consumes a
//! [`PinVerifier`] and reports lock state through an [`AuthSession`] that
//! callers hold and pass around explicitly.
//!
//! # Module Structure
//!
//! - `pin`: The verifier interface and its Argon2 implementation
//! - `session`: Lock state with change subscriptions
//!
//! # Example
//!
//! ```
//! use daybook::auth::{Argon2PinVerifier, AuthSession, LockState, PinVerifier};
//!
//! let verifier = Argon2PinVerifier::default();
//! let hash = verifier.hash_pin("2468")?;
//!
//! let session = AuthSession::new();
//! let mut changes = session.subscribe();
//! if verifier.verify_pin("2468", &hash) {
//!     session.unlock();
//! }
//! assert_eq!(*changes.borrow_and_update(), LockState::Unlocked);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod pin;
pub mod session;

pub use self::pin::{Argon2PinVerifier, PinVerifier};
pub use self::session::{AuthSession, LockState};
