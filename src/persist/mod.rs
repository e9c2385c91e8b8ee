//! Persistence abstraction with JSON-file, SQLite, and in-memory backends.

pub mod json;
pub mod sqlite;

use std::{
    path::PathBuf,
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicUsize, Ordering},
    },
};

use thiserror::Error;

use crate::error::ValidationError;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("stored record is invalid: {0}")]
    Decode(#[from] ValidationError),
    #[error("{0}")]
    Message(String),
}

pub type PersistResult<T> = Result<T, PersistError>;

/// Durable home for one ordered collection of records.
///
/// `save_all` replaces the whole collection; there is no append path.
pub trait RecordSink<T>: Send {
    /// Loads every stored record in order. Missing storage yields an empty list.
    fn load_all(&mut self) -> PersistResult<Vec<T>>;

    /// Overwrites storage with exactly `records`.
    fn save_all(&mut self, records: &[T]) -> PersistResult<()>;

    /// Human-readable location for log lines.
    fn describe(&self) -> String;
}

/// Volatile sink for tests and throwaway decks.
///
/// Clones share the same backing list, so a clone kept by the caller sees
/// everything saved through the one handed to a store.
#[derive(Debug)]
pub struct MemorySink<T> {
    records: Arc<Mutex<Vec<T>>>,
    saves: Arc<AtomicUsize>,
}

impl<T> MemorySink<T> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    /// Sink pre-populated as if a previous run had saved `records`.
    pub fn with_records(records: Vec<T>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            saves: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of `save_all` calls so far.
    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    fn lock(&self) -> PersistResult<MutexGuard<'_, Vec<T>>> {
        self.records
            .lock()
            .map_err(|_| PersistError::Message("memory sink lock poisoned".to_string()))
    }
}

impl<T: Clone> MemorySink<T> {
    /// Copy of the currently saved records.
    pub fn snapshot(&self) -> Vec<T> {
        self.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

impl<T> Clone for MemorySink<T> {
    fn clone(&self) -> Self {
        Self {
            records: Arc::clone(&self.records),
            saves: Arc::clone(&self.saves),
        }
    }
}

impl<T> Default for MemorySink<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> RecordSink<T> for MemorySink<T> {
    fn load_all(&mut self) -> PersistResult<Vec<T>> {
        Ok(self.lock()?.clone())
    }

    fn save_all(&mut self, records: &[T]) -> PersistResult<()> {
        *self.lock()? = records.to_vec();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
