//! Layered configuration and store wiring.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`FLASHDECK_*`, `__` separates sections)
//! 2. `./flashdeck.toml`
//! 3. `<config dir>/flashdeck/config.toml`
//! 4. Built-in defaults

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::{
    card::CardRecord,
    core::{
        review_log::{ReviewError, ReviewLog},
        store::{CardStore, StoreError},
    },
    persist::{PersistError, RecordSink, json::JsonFileSink, sqlite::SqliteSink},
    review::ReviewRecord,
    session::runner::SessionOptions,
    types::DEFAULT_DUE_LIMIT,
};

/// Project-local config file name.
pub const LOCAL_CONFIG_FILE: &str = "flashdeck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),
    #[error("invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Persist(#[from] PersistError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Json,
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Directory holding the data files.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cards_file")]
    pub cards_file: String,
    #[serde(default = "default_reviews_file")]
    pub reviews_file: String,
    #[serde(default = "default_sqlite_file")]
    pub sqlite_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_cards_file() -> String {
    "flashcards.json".to_string()
}

fn default_reviews_file() -> String {
    "review_history.json".to_string()
}

fn default_sqlite_file() -> String {
    "flashdeck.db".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            data_dir: default_data_dir(),
            cards_file: default_cards_file(),
            reviews_file: default_reviews_file(),
            sqlite_file: default_sqlite_file(),
        }
    }
}

impl StorageConfig {
    pub fn cards_path(&self) -> PathBuf {
        self.data_dir.join(&self.cards_file)
    }

    pub fn reviews_path(&self) -> PathBuf {
        self.data_dir.join(&self.reviews_file)
    }

    pub fn sqlite_path(&self) -> PathBuf {
        self.data_dir.join(&self.sqlite_file)
    }
}

const fn default_due_limit() -> usize {
    DEFAULT_DUE_LIMIT
}

const fn default_shuffle() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StudyConfig {
    /// Cards drawn per study or quiz session.
    #[serde(default = "default_due_limit")]
    pub due_limit: usize,
    /// Shuffle drawn cards.
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            due_limit: default_due_limit(),
            shuffle: default_shuffle(),
        }
    }
}

impl StudyConfig {
    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            limit: self.due_limit,
            shuffle: self.shuffle,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct FlashdeckConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub study: StudyConfig,
}

impl FlashdeckConfig {
    /// Loads from every source and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extracts and validates from a caller-built figment.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    /// Provider chain without extraction, for callers that add layers.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = Path::new(LOCAL_CONFIG_FILE);
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("FLASHDECK_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("flashdeck").join("config.toml"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.study.due_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "study.due_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        for (field, value) in [
            ("storage.cards_file", &self.storage.cards_file),
            ("storage.reviews_file", &self.storage.reviews_file),
            ("storage.sqlite_file", &self.storage.sqlite_file),
        ] {
            if value.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: field.to_string(),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.storage.backend == Backend::Json && self.storage.cards_file == self.storage.reviews_file {
            return Err(ConfigError::InvalidValue {
                field: "storage.reviews_file".to_string(),
                reason: "must differ from storage.cards_file".to_string(),
            });
        }
        Ok(())
    }

    /// Opens the card store and review log on the configured backend.
    pub fn open_stores(&self) -> Result<(CardStore, ReviewLog), ConfigError> {
        let cards: Box<dyn RecordSink<CardRecord>>;
        let reviews: Box<dyn RecordSink<ReviewRecord>>;
        match self.storage.backend {
            Backend::Json => {
                cards = Box::new(JsonFileSink::<CardRecord>::new(self.storage.cards_path()));
                reviews = Box::new(JsonFileSink::<ReviewRecord>::new(self.storage.reviews_path()));
            }
            Backend::Sqlite => {
                let path = self.storage.sqlite_path();
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                        path: parent.to_path_buf(),
                        source,
                    })?;
                }
                cards = Box::new(SqliteSink::open(&path)?);
                reviews = Box::new(SqliteSink::open(&path)?);
            }
        }

        info!(backend = ?self.storage.backend, dir = %self.storage.data_dir.display(), "opening stores");
        Ok((CardStore::open(cards)?, ReviewLog::open(reviews)?))
    }
}

#[cfg(test)]
mod tests {
    use figment::Jail;

    use super::*;

    #[test]
    fn defaults_use_legacy_file_names() {
        let config = FlashdeckConfig::default();
        assert_eq!(config.storage.backend, Backend::Json);
        assert_eq!(config.storage.cards_path(), PathBuf::from("./flashcards.json"));
        assert_eq!(config.storage.reviews_path(), PathBuf::from("./review_history.json"));
        assert_eq!(config.study.due_limit, 10);
        assert!(config.study.shuffle);
    }

    #[test]
    fn local_file_and_env_layer_over_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                LOCAL_CONFIG_FILE,
                r#"
                [storage]
                backend = "sqlite"
                data_dir = "decks"

                [study]
                due_limit = 4
                "#,
            )?;
            jail.set_env("FLASHDECK_STUDY__SHUFFLE", "false");
            jail.set_env("FLASHDECK_STUDY__DUE_LIMIT", "7");

            let config = FlashdeckConfig::load().expect("config");
            assert_eq!(config.storage.backend, Backend::Sqlite);
            assert_eq!(config.storage.sqlite_path(), PathBuf::from("decks/flashdeck.db"));
            assert_eq!(config.study.due_limit, 7);
            assert!(!config.study.shuffle);
            Ok(())
        });
    }

    #[test]
    fn zero_due_limit_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("FLASHDECK_STUDY__DUE_LIMIT", "0");
            let err = FlashdeckConfig::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { .. }));
            Ok(())
        });
    }

    #[test]
    fn open_stores_on_both_backends() {
        for backend in [Backend::Json, Backend::Sqlite] {
            let tmp = tempfile::TempDir::new().unwrap();
            let config = FlashdeckConfig {
                storage: StorageConfig {
                    backend,
                    data_dir: tmp.path().join("data"),
                    ..StorageConfig::default()
                },
                ..FlashdeckConfig::default()
            };

            let (mut store, mut log) = config.open_stores().unwrap();
            let card = store.add("hola", "hello", Some("Spanish".into())).unwrap();
            log.log_review(card.id(), 4).unwrap();
            drop((store, log));

            let (store, log) = config.open_stores().unwrap();
            assert_eq!(store.get(card.id()), Some(&card));
            assert_eq!(log.len(), 1);
        }
    }
}
