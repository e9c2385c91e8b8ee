//! SQLite sink: cards and review history as two tables in one database.

use std::path::{Path, PathBuf};

use rusqlite::{Connection, params};
use tracing::debug;

use crate::{card::CardRecord, review::ReviewRecord};

use super::{PersistResult, RecordSink};

/// SQLite implementation of [`RecordSink`] for both record kinds.
///
/// Each save rewrites its table inside a single transaction, so readers
/// never observe a half-written collection.
pub struct SqliteSink {
    conn: Connection,
    label: String,
}

impl SqliteSink {
    /// Opens or creates a database at `path`.
    ///
    /// Enables WAL mode and sets `synchronous=NORMAL`.
    pub fn open(path: impl AsRef<Path>) -> PersistResult<Self> {
        let path: PathBuf = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)?;
        Self::init_connection(conn, path.display().to_string())
    }

    /// Opens a private in-memory database.
    pub fn open_in_memory() -> PersistResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_connection(conn, ":memory:".to_string())
    }

    fn init_connection(conn: Connection, label: String) -> PersistResult<Self> {
        conn.execute_batch(include_str!("schema.sql"))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(Self { conn, label })
    }
}

impl RecordSink<CardRecord> for SqliteSink {
    fn load_all(&mut self) -> PersistResult<Vec<CardRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, front, back, topic, box, created_at, last_reviewed FROM cards ORDER BY pos ASC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(CardRecord {
                id: row.get(0)?,
                front: row.get(1)?,
                back: row.get(2)?,
                topic: row.get(3)?,
                level: row.get(4)?,
                created_at: row.get(5)?,
                last_reviewed: row.get(6)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn save_all(&mut self, records: &[CardRecord]) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM cards", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO cards(pos, id, front, back, topic, box, created_at, last_reviewed) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for (pos, rec) in records.iter().enumerate() {
                stmt.execute(params![
                    pos as i64,
                    rec.id,
                    rec.front,
                    rec.back,
                    rec.topic,
                    rec.level,
                    rec.created_at,
                    rec.last_reviewed,
                ])?;
            }
        }
        tx.commit()?;
        debug!(db = %self.label, count = records.len(), "saved cards table");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}#cards", self.label)
    }
}

impl RecordSink<ReviewRecord> for SqliteSink {
    fn load_all(&mut self) -> PersistResult<Vec<ReviewRecord>> {
        let mut stmt = self
            .conn
            .prepare("SELECT card_id, timestamp, performance FROM reviews ORDER BY seq ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(ReviewRecord {
                card_id: row.get(0)?,
                timestamp: row.get(1)?,
                performance: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn save_all(&mut self, records: &[ReviewRecord]) -> PersistResult<()> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM reviews", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO reviews(seq, card_id, timestamp, performance) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (seq, rec) in records.iter().enumerate() {
                stmt.execute(params![seq as i64, rec.card_id, rec.timestamp, rec.performance])?;
            }
        }
        tx.commit()?;
        debug!(db = %self.label, count = records.len(), "saved reviews table");
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}#reviews", self.label)
    }
}
