use std::fmt;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    card::Card,
    error::ValidationError,
    persist::{MemorySink, PersistError, RecordSink},
    review::{ReviewEvent, ReviewRecord},
    types::{self, CardId, Performance},
};

use super::leitner::next_box;

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("review storage failed: {0}")]
    Persist(#[from] PersistError),
}

/// Append-only history of scored reviews.
///
/// Events only reference cards by id and are never reconciled against the
/// card store, so history outlives deleted cards.
pub struct ReviewLog {
    events: Vec<ReviewEvent>,
    sink: Box<dyn RecordSink<ReviewRecord>>,
}

impl fmt::Debug for ReviewLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewLog")
            .field("events", &self.events.len())
            .field("sink", &self.sink.describe())
            .finish()
    }
}

impl ReviewLog {
    /// Loads history from `sink`; missing storage means no history.
    pub fn open(mut sink: Box<dyn RecordSink<ReviewRecord>>) -> Result<Self, ReviewError> {
        let events = sink
            .load_all()?
            .into_iter()
            .map(ReviewEvent::from_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(PersistError::from)?;
        info!(events = events.len(), source = %sink.describe(), "review log loaded");
        Ok(Self { events, sink })
    }

    /// Empty log backed by a [`MemorySink`].
    pub fn in_memory() -> Self {
        Self {
            events: Vec::new(),
            sink: Box::new(MemorySink::new()),
        }
    }

    /// Appends a review stamped now and persists the full log.
    ///
    /// `performance` outside `1..=5` is rejected before anything changes.
    pub fn log_review(&mut self, card_id: &CardId, performance: i64) -> Result<&ReviewEvent, ReviewError> {
        let performance = Performance::new(performance)?;
        self.events.push(ReviewEvent {
            card_id: card_id.clone(),
            timestamp: types::now(),
            performance,
        });

        if let Err(err) = self.persist() {
            warn!(%card_id, error = %err, "rolling back review append");
            self.events.pop();
            return Err(err.into());
        }

        debug!(%card_id, %performance, total = self.events.len(), "review logged");
        self.events
            .last()
            .ok_or_else(|| PersistError::Message("review vanished after append".to_string()).into())
    }

    /// Moves `card` to its next box and stamps `last_reviewed`.
    ///
    /// In-memory only: the caller must persist the card store afterwards
    /// (see [`CardStore::update_with`](crate::core::store::CardStore::update_with)).
    pub fn adjust_box(card: &mut Card, performance: Performance) {
        let level = next_box(card.level(), performance);
        card.set_study_state(level, types::now());
    }

    /// Writes the full log to the sink.
    pub fn persist(&mut self) -> Result<(), PersistError> {
        let records: Vec<ReviewRecord> = self.events.iter().map(ReviewEvent::to_record).collect();
        self.sink.save_all(&records)
    }

    pub fn events(&self) -> &[ReviewEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Every event for `card_id`, oldest first.
    pub fn history_for(&self, card_id: &CardId) -> Vec<&ReviewEvent> {
        self.events.iter().filter(|e| &e.card_id == card_id).collect()
    }

    pub fn last_review_of(&self, card_id: &CardId) -> Option<&ReviewEvent> {
        self.events.iter().rev().find(|e| &e.card_id == card_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LeitnerBox;

    fn perf(n: i64) -> Performance {
        Performance::new(n).unwrap()
    }

    #[test]
    fn adjust_box_on_fresh_card_promotes_and_stamps() {
        let mut card = Card::new("2+2", "4", None).unwrap();
        ReviewLog::adjust_box(&mut card, perf(4));
        assert_eq!(card.level().get(), 2);
        assert!(card.last_reviewed().is_some());
    }

    #[test]
    fn adjust_box_floor_still_stamps() {
        let mut card = Card::new("q", "a", None).unwrap();
        ReviewLog::adjust_box(&mut card, perf(1));
        assert_eq!(card.level(), LeitnerBox::MIN);
        assert!(card.last_reviewed().is_some());
    }

    #[test]
    fn adjust_box_ceiling() {
        let mut card = Card::new("q", "a", None).unwrap();
        for _ in 0..6 {
            ReviewLog::adjust_box(&mut card, perf(5));
        }
        assert_eq!(card.level(), LeitnerBox::MAX);
        ReviewLog::adjust_box(&mut card, perf(5));
        assert_eq!(card.level(), LeitnerBox::MAX);
    }

    #[test]
    fn log_review_rejects_bad_scores_without_appending() {
        let mut log = ReviewLog::in_memory();
        let id = CardId::generate();
        for bad in [0, 6, -1] {
            assert!(matches!(
                log.log_review(&id, bad),
                Err(ReviewError::Validation(ValidationError::PerformanceOutOfRange(_)))
            ));
        }
        assert!(log.is_empty());
    }

    #[test]
    fn history_is_per_card_in_order() {
        let mut log = ReviewLog::in_memory();
        let a = CardId::generate();
        let b = CardId::generate();
        log.log_review(&a, 2).unwrap();
        log.log_review(&b, 5).unwrap();
        log.log_review(&a, 4).unwrap();

        let scores: Vec<u8> = log.history_for(&a).iter().map(|e| e.performance.get()).collect();
        assert_eq!(scores, vec![2, 4]);
        assert_eq!(log.last_review_of(&b).map(|e| e.performance.get()), Some(5));
        assert_eq!(log.len(), 3);
    }
}
