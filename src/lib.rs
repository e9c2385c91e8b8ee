//! Leitner-box flashcards with whole-collection JSON or SQLite persistence.
//!
//! # Examples
//!
//! In-memory usage with [`core::store::CardStore`] and
//! [`core::review_log::ReviewLog`]:
//! ```
//! use flashdeck::core::{review_log::ReviewLog, store::CardStore};
//! use flashdeck::types::Performance;
//!
//! let mut store = CardStore::in_memory();
//! let mut log = ReviewLog::in_memory();
//!
//! let card = store.add("2+2", "4", None).expect("add");
//! assert_eq!(card.level().get(), 1);
//!
//! log.log_review(card.id(), 4).expect("log");
//! let performance = Performance::new(4).expect("score");
//! let card = store
//!     .update_with(card.id(), |c| ReviewLog::adjust_box(c, performance))
//!     .expect("persist");
//! assert_eq!(card.level().get(), 2);
//! ```
//!
//! File-backed usage with JSON sinks:
//! ```no_run
//! use flashdeck::{
//!     card::CardRecord,
//!     core::{review_log::ReviewLog, store::CardStore},
//!     persist::json::JsonFileSink,
//!     review::ReviewRecord,
//! };
//!
//! let mut store = CardStore::open(Box::new(JsonFileSink::<CardRecord>::new("flashcards.json"))).expect("open cards");
//! let log = ReviewLog::open(Box::new(JsonFileSink::<ReviewRecord>::new("review_history.json"))).expect("open log");
//! store.add("hola", "hello", Some("Spanish".to_string())).expect("add");
//! for card in store.due_cards(10) {
//!     println!("{} (box {})", card.front(), card.level());
//! }
//! # drop(log);
//! ```

/// Card entity, edit patch, and persisted card schema.
pub mod card;
/// Layered configuration and store wiring.
pub mod config;
/// Card store, review log, and the Leitner rule.
pub mod core;
/// Input validation errors.
pub mod error;
/// Persistence abstraction and backends.
pub mod persist;
/// Review events and persisted review schema.
pub mod review;
/// Single-writer runtime handle and events.
pub mod runtime;
/// Study sessions and scoring modes.
pub mod session;
/// Shared primitive types.
pub mod types;
