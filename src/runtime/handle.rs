use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, info};

use crate::{
    card::{Card, CardPatch},
    core::{
        review_log::{ReviewError, ReviewLog},
        store::{CardStore, StoreError},
    },
    error::ValidationError,
    review::ReviewEvent,
    types::{CardId, Performance},
};

use super::events::DeckEvent;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error("deck runtime is no longer running")]
    ChannelClosed,
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command_queue_bound: usize,
    pub event_capacity: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            command_queue_bound: 64,
            event_capacity: 256,
        }
    }
}

/// Cloneable handle to the task that owns the card store and review log.
///
/// Every command is applied by one blocking worker in arrival order, so
/// concurrent callers never interleave inside a full-collection rewrite.
pub struct DeckHandle {
    cmd_tx: mpsc::Sender<Command>,
    events_tx: broadcast::Sender<DeckEvent>,
}

impl Clone for DeckHandle {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            events_tx: self.events_tx.clone(),
        }
    }
}

enum Command {
    AddCard {
        front: String,
        back: String,
        topic: Option<String>,
        resp: oneshot::Sender<Result<Card, RuntimeError>>,
    },
    EditCard {
        id: CardId,
        patch: CardPatch,
        resp: oneshot::Sender<Result<Card, RuntimeError>>,
    },
    DeleteCard {
        id: CardId,
        resp: oneshot::Sender<Result<Card, RuntimeError>>,
    },
    Review {
        id: CardId,
        performance: i64,
        resp: oneshot::Sender<Result<Card, RuntimeError>>,
    },
    Get {
        id: CardId,
        resp: oneshot::Sender<Option<Card>>,
    },
    ListByTopic {
        topic: String,
        resp: oneshot::Sender<Vec<Card>>,
    },
    DueCards {
        limit: usize,
        resp: oneshot::Sender<Vec<Card>>,
    },
    History {
        id: CardId,
        resp: oneshot::Sender<Vec<ReviewEvent>>,
    },
    Shutdown {
        resp: oneshot::Sender<()>,
    },
}

/// Moves `store` and `log` onto a dedicated blocking worker.
///
/// Must be called from within a Tokio runtime.
pub fn spawn_deck(store: CardStore, log: ReviewLog, config: RuntimeConfig) -> DeckHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<Command>(config.command_queue_bound.max(1));
    let (events_tx, _) = broadcast::channel::<DeckEvent>(config.event_capacity.max(1));
    let events_tx_loop = events_tx.clone();

    tokio::task::spawn_blocking(move || {
        let mut store = store;
        let mut log = log;
        info!(cards = store.len(), reviews = log.len(), "deck runtime started");

        while let Some(cmd) = cmd_rx.blocking_recv() {
            if handle_command(cmd, &mut store, &mut log, &events_tx_loop) {
                break;
            }
        }
        info!("deck runtime stopped");
    });

    DeckHandle { cmd_tx, events_tx }
}

impl DeckHandle {
    pub fn subscribe(&self) -> broadcast::Receiver<DeckEvent> {
        self.events_tx.subscribe()
    }

    pub async fn add_card(
        &self,
        front: impl Into<String>,
        back: impl Into<String>,
        topic: Option<String>,
    ) -> Result<Card, RuntimeError> {
        let (front, back) = (front.into(), back.into());
        self.call(|resp| Command::AddCard {
            front,
            back,
            topic,
            resp,
        })
        .await?
    }

    pub async fn edit_card(&self, id: CardId, patch: CardPatch) -> Result<Card, RuntimeError> {
        self.call(|resp| Command::EditCard { id, patch, resp }).await?
    }

    pub async fn delete_card(&self, id: CardId) -> Result<Card, RuntimeError> {
        self.call(|resp| Command::DeleteCard { id, resp }).await?
    }

    /// Logs a review and moves the card's box as one serialized step.
    pub async fn review(&self, id: CardId, performance: i64) -> Result<Card, RuntimeError> {
        self.call(|resp| Command::Review {
            id,
            performance,
            resp,
        })
        .await?
    }

    pub async fn get(&self, id: CardId) -> Result<Option<Card>, RuntimeError> {
        self.call(|resp| Command::Get { id, resp }).await
    }

    pub async fn list_by_topic(&self, topic: impl Into<String>) -> Result<Vec<Card>, RuntimeError> {
        let topic = topic.into();
        self.call(|resp| Command::ListByTopic { topic, resp }).await
    }

    pub async fn due_cards(&self, limit: usize) -> Result<Vec<Card>, RuntimeError> {
        self.call(|resp| Command::DueCards { limit, resp }).await
    }

    pub async fn history(&self, id: CardId) -> Result<Vec<ReviewEvent>, RuntimeError> {
        self.call(|resp| Command::History { id, resp }).await
    }

    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        self.call(|resp| Command::Shutdown { resp }).await
    }

    async fn call<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T, RuntimeError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(make(tx))
            .await
            .map_err(|_| RuntimeError::ChannelClosed)?;
        rx.await.map_err(|_| RuntimeError::ChannelClosed)
    }
}

fn handle_command(
    cmd: Command,
    store: &mut CardStore,
    log: &mut ReviewLog,
    events_tx: &broadcast::Sender<DeckEvent>,
) -> bool {
    match cmd {
        Command::AddCard {
            front,
            back,
            topic,
            resp,
        } => {
            let res = store.add(front, back, topic).map_err(RuntimeError::from);
            if let Ok(card) = &res {
                let _ = events_tx.send(DeckEvent::CardAdded {
                    id: card.id().clone(),
                });
            }
            let _ = resp.send(res);
        }
        Command::EditCard { id, patch, resp } => {
            let res = store.edit(&id, patch).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(DeckEvent::CardEdited { id });
            }
            let _ = resp.send(res);
        }
        Command::DeleteCard { id, resp } => {
            let res = store.delete(&id).map_err(RuntimeError::from);
            if res.is_ok() {
                let _ = events_tx.send(DeckEvent::CardDeleted { id });
            }
            let _ = resp.send(res);
        }
        Command::Review {
            id,
            performance,
            resp,
        } => {
            let res = review(store, log, &id, performance).map(|(card, performance)| {
                let _ = events_tx.send(DeckEvent::Reviewed {
                    id,
                    performance,
                    level: card.level(),
                });
                card
            });
            let _ = resp.send(res);
        }
        Command::Get { id, resp } => {
            let _ = resp.send(store.get_cloned(&id));
        }
        Command::ListByTopic { topic, resp } => {
            let _ = resp.send(store.list_by_topic_cloned(&topic));
        }
        Command::DueCards { limit, resp } => {
            let _ = resp.send(store.due_cards_cloned(limit));
        }
        Command::History { id, resp } => {
            let _ = resp.send(log.history_for(&id).into_iter().cloned().collect());
        }
        Command::Shutdown { resp } => {
            debug!("shutdown requested");
            let _ = resp.send(());
            return true;
        }
    }

    false
}

fn review(
    store: &mut CardStore,
    log: &mut ReviewLog,
    id: &CardId,
    performance: i64,
) -> Result<(Card, Performance), RuntimeError> {
    let performance = Performance::new(performance)?;
    if store.get(id).is_none() {
        return Err(StoreError::NotFound(id.clone()).into());
    }
    log.log_review(id, i64::from(performance.get()))?;
    let card = store.update_with(id, |card| ReviewLog::adjust_box(card, performance))?;
    Ok((card, performance))
}
