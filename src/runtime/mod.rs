//! Single-writer deck runtime and event stream APIs.
//!
//! Optional front door for callers that share one deck across async tasks.
//! The `flashdeck` binary does not use it; it drives
//! [`CardStore`](crate::core::store::CardStore) and
//! [`ReviewLog`](crate::core::review_log::ReviewLog) directly on the calling
//! thread, and nothing runs in the background unless [`handle::spawn_deck`]
//! is called.

/// Event stream types emitted by the runtime.
pub mod events;
/// Handle and command loop implementation.
pub mod handle;
