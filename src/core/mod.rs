//! In-memory authoritative stores and the Leitner rule.

/// Topic index alias.
pub mod indices;
/// Pure box-adjustment rule.
pub mod leitner;
/// Append-only review history.
pub mod review_log;
/// Authoritative card collection.
pub mod store;
