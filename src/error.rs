//! Input validation errors shared by every layer.

use thiserror::Error;

/// Malformed input rejected before any state is touched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Card front text was empty.
    #[error("card front must not be empty")]
    EmptyFront,
    /// Card back text was empty.
    #[error("card back must not be empty")]
    EmptyBack,
    /// Card id was empty.
    #[error("card id must not be empty")]
    EmptyId,
    /// Box level outside `1..=5`.
    #[error("box {0} is outside 1..=5")]
    BoxOutOfRange(i64),
    /// Recall score outside `1..=5`.
    #[error("performance {0} is outside 1..=5")]
    PerformanceOutOfRange(i64),
    /// Timestamp text could not be parsed.
    #[error("unparseable timestamp: {0}")]
    BadTimestamp(String),
}
