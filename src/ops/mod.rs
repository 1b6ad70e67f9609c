//! High-level asynchronous operations for presentation layers.
//!
//! Storage calls are blocking; everything here moves them onto tokio's
//! blocking pool so an async caller (a UI event loop, the CLI runtime) is
//! never stalled by disk I/O.

pub mod journal;
pub mod unlock;

pub use journal::Journal;
pub use unlock::Unlocker;
