use std::collections::VecDeque;

use rand::seq::SliceRandom;
use thiserror::Error;
use tracing::debug;

use crate::{
    card::Card,
    core::{
        review_log::{ReviewError, ReviewLog},
        store::{CardStore, StoreError},
    },
    error::ValidationError,
    types::{CardId, DEFAULT_DUE_LIMIT, Performance},
};

use super::traits::{ScoringMode, SessionSummary};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no card is being shown")]
    NoCurrentCard,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Review(#[from] ReviewError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// How many due cards to draw when the session starts.
    pub limit: usize,
    /// Shuffle the drawn cards instead of serving them lowest box first.
    pub shuffle: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            limit: DEFAULT_DUE_LIMIT,
            shuffle: true,
        }
    }
}

/// Serves a fixed batch of due cards and records each score.
///
/// The batch is drawn once at construction; scoring a card changes its box
/// but never re-queues it.
pub struct SessionRunner<'a, M: ScoringMode> {
    store: &'a mut CardStore,
    log: &'a mut ReviewLog,
    mode: M,
    queue: VecDeque<CardId>,
    current: Option<CardId>,
}

impl<'a, M: ScoringMode> SessionRunner<'a, M> {
    pub fn new(store: &'a mut CardStore, log: &'a mut ReviewLog, mode: M, options: SessionOptions) -> Self {
        let mut ids: Vec<CardId> = store
            .due_cards(options.limit)
            .into_iter()
            .map(|card| card.id().clone())
            .collect();
        if options.shuffle {
            ids.shuffle(&mut rand::thread_rng());
        }
        debug!(cards = ids.len(), shuffle = options.shuffle, "session started");

        Self {
            store,
            log,
            mode,
            queue: ids.into(),
            current: None,
        }
    }

    /// Cards not yet shown.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Card currently awaiting a score.
    pub fn current(&self) -> Option<&Card> {
        self.current.as_ref().and_then(|id| self.store.get(id))
    }

    /// Advances to the next card still present in the store.
    ///
    /// An unscored current card is dropped.
    pub fn next_card(&mut self) -> Option<Card> {
        self.current = None;
        while let Some(id) = self.queue.pop_front() {
            if let Some(card) = self.store.get_cloned(&id) {
                self.current = Some(id);
                return Some(card);
            }
            debug!(%id, "skipping card deleted mid-session");
        }
        None
    }

    /// Scores the current card: log the review, move its box, persist the
    /// store, then let the scoring mode see it.
    ///
    /// A rejected score keeps the current card so the caller can retry.
    pub fn submit(&mut self, performance: i64) -> Result<Card, SessionError> {
        let id = self.current.clone().ok_or(SessionError::NoCurrentCard)?;
        let performance = Performance::new(performance)?;
        if self.store.get(&id).is_none() {
            self.current = None;
            return Err(StoreError::NotFound(id).into());
        }

        self.log.log_review(&id, i64::from(performance.get()))?;
        let card = self
            .store
            .update_with(&id, |card| ReviewLog::adjust_box(card, performance))?;
        self.mode.record(performance);
        self.current = None;
        Ok(card)
    }

    /// Mutable access to the store mid-session; cards removed here are
    /// skipped by later `next_card` calls.
    pub fn store_mut(&mut self) -> &mut CardStore {
        self.store
    }

    pub fn summary(&self) -> SessionSummary {
        self.mode.summary()
    }

    pub fn into_mode(self) -> M {
        self.mode
    }
}
