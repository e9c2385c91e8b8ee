//! Shared primitive ids, bounded levels, and timestamp helpers.

use std::fmt;

use chrono::{DateTime, Local, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Topic assigned when the caller gives none.
pub const DEFAULT_TOPIC: &str = "General";

/// Default number of cards returned by a due-card query.
pub const DEFAULT_DUE_LIMIT: usize = 10;

/// Wall-clock instant stored on cards and review events.
pub type Timestamp = DateTime<Utc>;

/// Opaque, immutable card identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CardId(String);

impl CardId {
    /// Generates a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Wraps an existing identifier, rejecting the empty string.
    pub fn parse(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(ValidationError::EmptyId);
        }
        Ok(Self(raw))
    }

    /// Borrowed identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<CardId> for String {
    fn from(value: CardId) -> Self {
        value.0
    }
}

/// Leitner box level; lower boxes are studied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LeitnerBox(u8);

impl LeitnerBox {
    /// Lowest (most due) box.
    pub const MIN: Self = Self(1);
    /// Highest (least due) box.
    pub const MAX: Self = Self(5);

    /// Validates a raw level.
    pub fn new(level: i64) -> Result<Self, ValidationError> {
        if (i64::from(Self::MIN.0)..=i64::from(Self::MAX.0)).contains(&level) {
            Ok(Self(level as u8))
        } else {
            Err(ValidationError::BoxOutOfRange(level))
        }
    }

    /// Raw level in `1..=5`.
    pub fn get(self) -> u8 {
        self.0
    }

    /// One box up, saturating at [`LeitnerBox::MAX`].
    pub fn promoted(self) -> Self {
        if self < Self::MAX { Self(self.0 + 1) } else { self }
    }

    /// One box down, saturating at [`LeitnerBox::MIN`].
    pub fn demoted(self) -> Self {
        if self > Self::MIN { Self(self.0 - 1) } else { self }
    }
}

impl Default for LeitnerBox {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for LeitnerBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Self-rated recall score in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Performance(u8);

impl Performance {
    /// Lowest score that counts as a successful recall.
    pub const PASS: Self = Self(3);

    /// Validates a raw score.
    pub fn new(score: i64) -> Result<Self, ValidationError> {
        if (1..=5).contains(&score) {
            Ok(Self(score as u8))
        } else {
            Err(ValidationError::PerformanceOutOfRange(score))
        }
    }

    /// Raw score in `1..=5`.
    pub fn get(self) -> u8 {
        self.0
    }

    /// True when the score is at least [`Performance::PASS`].
    pub fn is_pass(self) -> bool {
        self >= Self::PASS
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current wall-clock time.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Renders a timestamp as RFC 3339 without losing sub-second precision.
pub fn format_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parses RFC 3339, falling back to a naive ISO-8601 string.
///
/// Naive strings were written in the machine's local time, so they are read
/// in the local zone and converted to UTC. A wall time skipped by a DST
/// change has no local reading and is taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<Timestamp, ValidationError> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map_err(|_| ValidationError::BadTimestamp(raw.to_string()))?;
    Ok(naive
        .and_local_timezone(Local)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_rejects_out_of_range_levels() {
        assert_eq!(LeitnerBox::new(0), Err(ValidationError::BoxOutOfRange(0)));
        assert_eq!(LeitnerBox::new(6), Err(ValidationError::BoxOutOfRange(6)));
        assert_eq!(LeitnerBox::new(3).map(LeitnerBox::get), Ok(3));
    }

    #[test]
    fn box_saturates_at_both_ends() {
        assert_eq!(LeitnerBox::MAX.promoted(), LeitnerBox::MAX);
        assert_eq!(LeitnerBox::MIN.demoted(), LeitnerBox::MIN);
    }

    #[test]
    fn performance_bounds() {
        assert!(Performance::new(0).is_err());
        assert!(Performance::new(6).is_err());
        assert!(Performance::new(3).unwrap().is_pass());
        assert!(!Performance::new(2).unwrap().is_pass());
    }

    #[test]
    fn naive_timestamps_are_read_as_local_time() {
        let ts = parse_timestamp("2024-03-01T09:15:30.123456").unwrap();
        let local = ts.with_timezone(&Local);
        assert_eq!(
            local.naive_local().format("%Y-%m-%dT%H:%M:%S%.6f").to_string(),
            "2024-03-01T09:15:30.123456"
        );
        assert!(format_timestamp(&ts).ends_with('Z'));
        assert_eq!(parse_timestamp(&format_timestamp(&ts)).unwrap(), ts);
    }

    #[test]
    fn rfc3339_round_trips() {
        let ts = parse_timestamp("2024-03-01T09:15:30.000001Z").unwrap();
        assert_eq!(parse_timestamp(&format_timestamp(&ts)).unwrap(), ts);
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn card_id_rejects_empty() {
        assert_eq!(CardId::parse(""), Err(ValidationError::EmptyId));
        assert_ne!(CardId::generate(), CardId::generate());
    }
}
