use std::fmt;

use hashbrown::{HashMap, HashSet};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    card::{Card, CardPatch, CardRecord},
    error::ValidationError,
    persist::{MemorySink, PersistError, RecordSink},
    types::CardId,
};

use super::indices::TopicIndex;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("no card with id {0}")]
    NotFound(CardId),
    #[error("card storage failed: {0}")]
    Persist(#[from] PersistError),
}

/// Authoritative, persisted card collection.
///
/// Every mutation rewrites the whole collection through the sink before it
/// returns. If the write fails the in-memory change is rolled back, so the
/// store never holds state that storage does not.
pub struct CardStore {
    cards: HashMap<CardId, Card>,
    order: Vec<CardId>,
    by_topic: TopicIndex,
    sink: Box<dyn RecordSink<CardRecord>>,
}

impl fmt::Debug for CardStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardStore")
            .field("cards", &self.order.len())
            .field("sink", &self.sink.describe())
            .finish()
    }
}

impl CardStore {
    /// Loads the collection from `sink`; missing storage means an empty deck.
    pub fn open(mut sink: Box<dyn RecordSink<CardRecord>>) -> Result<Self, StoreError> {
        let records = sink.load_all()?;
        let mut store = Self {
            cards: HashMap::with_capacity(records.len()),
            order: Vec::with_capacity(records.len()),
            by_topic: TopicIndex::new(),
            sink,
        };

        for rec in records {
            let card = Card::from_record(rec).map_err(PersistError::from)?;
            if store.cards.contains_key(card.id()) {
                return Err(PersistError::Message(format!(
                    "duplicate card id {} in {}",
                    card.id(),
                    store.sink.describe()
                ))
                .into());
            }
            store.insert_card(card);
        }

        info!(cards = store.len(), source = %store.sink.describe(), "card store loaded");
        Ok(store)
    }

    /// Empty store backed by a [`MemorySink`].
    pub fn in_memory() -> Self {
        Self {
            cards: HashMap::new(),
            order: Vec::new(),
            by_topic: TopicIndex::new(),
            sink: Box::new(MemorySink::new()),
        }
    }

    /// Creates a box-1 card and persists it. `None` topic means "General".
    pub fn add(
        &mut self,
        front: impl Into<String>,
        back: impl Into<String>,
        topic: Option<String>,
    ) -> Result<Card, StoreError> {
        let card = Card::new(front, back, topic)?;
        let id = card.id().clone();
        self.insert_card(card.clone());

        if let Err(err) = self.persist() {
            warn!(%id, error = %err, "rolling back add");
            self.remove_card(&id);
            return Err(err.into());
        }

        debug!(%id, topic = card.topic(), "card added");
        Ok(card)
    }

    /// Applies the fields present in `patch` to card `id` and persists.
    ///
    /// An unknown id is [`StoreError::NotFound`]; nothing is written.
    pub fn edit(&mut self, id: &CardId, patch: CardPatch) -> Result<Card, StoreError> {
        patch.validate()?;
        let card = self
            .cards
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if patch.is_empty() {
            return Ok(card.clone());
        }

        let old_topic = card.topic().to_string();
        let inverse = patch.capture_inverse_for(card);
        patch.apply_to(card);
        let new_topic = card.topic().to_string();
        self.retopic(&old_topic, &new_topic);

        if let Err(err) = self.persist() {
            warn!(%id, error = %err, "rolling back edit");
            if let Some(card) = self.cards.get_mut(id) {
                inverse.apply_to(card);
            }
            self.retopic(&new_topic, &old_topic);
            return Err(err.into());
        }

        debug!(%id, "card edited");
        self.cards
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.clone()))
    }

    /// Removes card `id` and persists. Review history is left alone.
    pub fn delete(&mut self, id: &CardId) -> Result<Card, StoreError> {
        let pos = self
            .order
            .iter()
            .position(|x| x == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let card = self
            .remove_card(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;

        if let Err(err) = self.persist() {
            warn!(%id, error = %err, "rolling back delete");
            let topic = card.topic().to_string();
            self.order.insert(pos, id.clone());
            self.cards.insert(id.clone(), card);
            self.reindex_topic(&topic);
            return Err(err.into());
        }

        debug!(%id, "card deleted");
        Ok(card)
    }

    /// Runs an in-memory mutation on card `id` (for example
    /// [`ReviewLog::adjust_box`](crate::core::review_log::ReviewLog::adjust_box))
    /// and then persists, restoring the previous card if the write fails.
    ///
    /// A mutation that leaves either face empty is undone and reported as
    /// [`StoreError::Validation`]; nothing is written.
    pub fn update_with<F>(&mut self, id: &CardId, f: F) -> Result<Card, StoreError>
    where
        F: FnOnce(&mut Card),
    {
        let card = self
            .cards
            .get_mut(id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        let before = card.clone();
        f(card);
        if let Err(err) = card.check_faces() {
            *card = before;
            return Err(err.into());
        }
        let after = card.clone();
        self.retopic(before.topic(), after.topic());

        if let Err(err) = self.persist() {
            warn!(%id, error = %err, "rolling back card update");
            let (old_topic, new_topic) = (before.topic().to_string(), after.topic().to_string());
            self.cards.insert(id.clone(), before);
            self.retopic(&new_topic, &old_topic);
            return Err(err.into());
        }

        Ok(after)
    }

    /// Writes the full collection to the sink.
    pub fn persist(&mut self) -> Result<(), PersistError> {
        let records: Vec<CardRecord> = self.iter().map(Card::to_record).collect();
        self.sink.save_all(&records)
    }

    pub fn get(&self, id: &CardId) -> Option<&Card> {
        self.cards.get(id)
    }

    pub fn get_cloned(&self, id: &CardId) -> Option<Card> {
        self.get(id).cloned()
    }

    /// Cards in store (insertion) order.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.order.iter().filter_map(|id| self.cards.get(id))
    }

    pub fn ordered_ids(&self) -> &[CardId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Cards whose topic equals `topic` exactly, in store order.
    pub fn list_by_topic(&self, topic: &str) -> Vec<&Card> {
        self.by_topic
            .get(topic)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.cards.get(id))
            .collect()
    }

    pub fn list_by_topic_cloned(&self, topic: &str) -> Vec<Card> {
        self.list_by_topic(topic).into_iter().cloned().collect()
    }

    /// Distinct topics in first-seen store order.
    pub fn topics(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.iter()
            .map(Card::topic)
            .filter(|t| seen.insert(*t))
            .collect()
    }

    /// Up to `limit` cards, lowest box first; equal boxes keep store order.
    ///
    /// Read-only: the returned cards stay in the store.
    pub fn due_cards(&self, limit: usize) -> Vec<&Card> {
        let mut due: Vec<&Card> = self.iter().collect();
        due.sort_by_key(|card| card.level());
        due.truncate(limit);
        due
    }

    pub fn due_cards_cloned(&self, limit: usize) -> Vec<Card> {
        self.due_cards(limit).into_iter().cloned().collect()
    }

    fn insert_card(&mut self, card: Card) {
        let id = card.id().clone();
        self.by_topic
            .entry(card.topic().to_string())
            .or_default()
            .push(id.clone());
        self.order.push(id.clone());
        self.cards.insert(id, card);
    }

    fn remove_card(&mut self, id: &CardId) -> Option<Card> {
        let card = self.cards.remove(id)?;
        self.order.retain(|x| x != id);
        if let Some(ids) = self.by_topic.get_mut(card.topic()) {
            Self::remove_from_vec_index(ids, id);
            if ids.is_empty() {
                self.by_topic.remove(card.topic());
            }
        }
        Some(card)
    }

    fn retopic(&mut self, old: &str, new: &str) {
        if old != new {
            self.reindex_topic(old);
            self.reindex_topic(new);
        }
    }

    fn reindex_topic(&mut self, topic: &str) {
        let ids: Vec<CardId> = self
            .iter()
            .filter(|card| card.topic() == topic)
            .map(|card| card.id().clone())
            .collect();
        if ids.is_empty() {
            self.by_topic.remove(topic);
        } else {
            self.by_topic.insert(topic.to_string(), ids);
        }
    }

    fn remove_from_vec_index(v: &mut Vec<CardId>, id: &CardId) {
        if let Some(pos) = v.iter().position(|x| x == id) {
            v.remove(pos);
        }
    }
}
