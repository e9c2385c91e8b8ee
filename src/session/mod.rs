//! Study sessions over the card store and review log.

/// Session runner that serves due cards and records scores.
pub mod runner;
/// Scoring strategies plugged into the runner.
pub mod traits;
