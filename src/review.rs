//! Review event model and its persisted schema.

use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    types::{self, CardId, Performance, Timestamp},
};

/// Immutable record of one scored study interaction.
///
/// `card_id` is a by-value reference; the card may since have been deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewEvent {
    /// Card that was reviewed.
    pub card_id: CardId,
    /// When the score was submitted.
    pub timestamp: Timestamp,
    /// Self-rated recall.
    pub performance: Performance,
}

impl ReviewEvent {
    /// Encodes into the persisted schema.
    pub fn to_record(&self) -> ReviewRecord {
        ReviewRecord {
            card_id: self.card_id.to_string(),
            timestamp: types::format_timestamp(&self.timestamp),
            performance: i64::from(self.performance.get()),
        }
    }

    /// Decodes and validates a persisted record.
    pub fn from_record(rec: ReviewRecord) -> Result<Self, ValidationError> {
        Ok(Self {
            card_id: CardId::parse(rec.card_id)?,
            timestamp: types::parse_timestamp(&rec.timestamp)?,
            performance: Performance::new(rec.performance)?,
        })
    }
}

/// Persisted review row. Field names match the review history file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Reviewed card id.
    pub card_id: String,
    /// Review time text.
    pub timestamp: String,
    /// Score; validated on decode.
    pub performance: i64,
}
