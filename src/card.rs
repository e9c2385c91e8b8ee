//! Card entity, sparse edit patch, and on-disk card schema.

use serde::{Deserialize, Serialize};

use crate::{
    error::ValidationError,
    types::{self, CardId, DEFAULT_TOPIC, LeitnerBox, Timestamp},
};

/// One flashcard: immutable identity plus mutable study state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: CardId,
    front: String,
    back: String,
    topic: String,
    level: LeitnerBox,
    created_at: Timestamp,
    last_reviewed: Option<Timestamp>,
}

impl Card {
    /// Builds a fresh box-1 card with a new id, rejecting empty faces.
    ///
    /// A `None` topic becomes [`DEFAULT_TOPIC`].
    pub fn new(
        front: impl Into<String>,
        back: impl Into<String>,
        topic: Option<String>,
    ) -> Result<Self, ValidationError> {
        let front = front.into();
        let back = back.into();
        check_faces(&front, &back)?;
        Ok(Self {
            id: CardId::generate(),
            front,
            back,
            topic: topic.unwrap_or_else(|| DEFAULT_TOPIC.to_string()),
            level: LeitnerBox::MIN,
            created_at: types::now(),
            last_reviewed: None,
        })
    }

    pub fn id(&self) -> &CardId {
        &self.id
    }

    pub fn front(&self) -> &str {
        &self.front
    }

    pub fn back(&self) -> &str {
        &self.back
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Current Leitner box.
    pub fn level(&self) -> LeitnerBox {
        self.level
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// When the card was last scored, if ever.
    pub fn last_reviewed(&self) -> Option<Timestamp> {
        self.last_reviewed
    }

    pub(crate) fn check_faces(&self) -> Result<(), ValidationError> {
        check_faces(&self.front, &self.back)
    }

    pub(crate) fn set_study_state(&mut self, level: LeitnerBox, reviewed_at: Timestamp) {
        self.level = level;
        self.last_reviewed = Some(reviewed_at);
    }

    /// Encodes into the persisted schema.
    pub fn to_record(&self) -> CardRecord {
        CardRecord {
            id: self.id.to_string(),
            front: self.front.clone(),
            back: self.back.clone(),
            topic: self.topic.clone(),
            level: i64::from(self.level.get()),
            created_at: types::format_timestamp(&self.created_at),
            last_reviewed: self.last_reviewed.as_ref().map(types::format_timestamp),
        }
    }

    /// Decodes and validates a persisted record.
    pub fn from_record(rec: CardRecord) -> Result<Self, ValidationError> {
        check_faces(&rec.front, &rec.back)?;
        Ok(Self {
            id: CardId::parse(rec.id)?,
            front: rec.front,
            back: rec.back,
            topic: rec.topic,
            level: LeitnerBox::new(rec.level)?,
            created_at: types::parse_timestamp(&rec.created_at)?,
            last_reviewed: rec
                .last_reviewed
                .as_deref()
                .map(types::parse_timestamp)
                .transpose()?,
        })
    }
}

fn check_faces(front: &str, back: &str) -> Result<(), ValidationError> {
    if front.is_empty() {
        return Err(ValidationError::EmptyFront);
    }
    if back.is_empty() {
        return Err(ValidationError::EmptyBack);
    }
    Ok(())
}

/// Persisted card row. Field names match the cards file layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRecord {
    /// Card identifier.
    pub id: String,
    /// Prompt side.
    pub front: String,
    /// Answer side.
    pub back: String,
    /// Topic label.
    pub topic: String,
    /// Leitner box; validated on decode.
    #[serde(rename = "box")]
    pub level: i64,
    /// Creation time text.
    pub created_at: String,
    /// Last review time text, `null` when never reviewed.
    pub last_reviewed: Option<String>,
}

/// Sparse edit where each `Some` field overwrites the card value.
///
/// `Some(String::new())` is a real value, distinct from `None`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardPatch {
    /// Optional replacement for the front.
    pub front: Option<String>,
    /// Optional replacement for the back.
    pub back: Option<String>,
    /// Optional replacement for the topic.
    pub topic: Option<String>,
}

impl CardPatch {
    /// Returns true when no fields are set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// Rejects a patch that would blank out either face.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.front.as_deref() == Some("") {
            return Err(ValidationError::EmptyFront);
        }
        if self.back.as_deref() == Some("") {
            return Err(ValidationError::EmptyBack);
        }
        Ok(())
    }

    /// Captures an inverse patch for all fields present in `self`.
    pub fn capture_inverse_for(&self, card: &Card) -> Self {
        Self {
            front: self.front.as_ref().map(|_| card.front.clone()),
            back: self.back.as_ref().map(|_| card.back.clone()),
            topic: self.topic.as_ref().map(|_| card.topic.clone()),
        }
    }

    /// Applies this patch in place to `card`.
    pub fn apply_to(&self, card: &mut Card) {
        if let Some(v) = &self.front {
            card.front = v.clone();
        }
        if let Some(v) = &self.back {
            card.back = v.clone();
        }
        if let Some(v) = &self.topic {
            card.topic = v.clone();
        }
    }
}
