//! Runtime event stream payloads.

use crate::types::{CardId, LeitnerBox, Performance};

/// Events emitted after a mutation has been persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckEvent {
    /// A card was created.
    CardAdded {
        /// New card id.
        id: CardId,
    },
    /// A card's text or topic changed.
    CardEdited {
        /// Edited card id.
        id: CardId,
    },
    /// A card was removed.
    CardDeleted {
        /// Removed card id.
        id: CardId,
    },
    /// A review was logged and the card moved boxes.
    Reviewed {
        /// Reviewed card id.
        id: CardId,
        /// Submitted score.
        performance: Performance,
        /// Box after adjustment.
        level: LeitnerBox,
    },
}
