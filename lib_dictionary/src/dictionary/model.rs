//! # Dictionary Entry Model
//!
//! The cached outcome of one word lookup and the expiry policy attached to
//! each kind of outcome.

use chrono::{DateTime, Months, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

/// How long a failed lookup is cached before the word may be fetched again.
pub const FAILURE_TTL: TimeDelta = TimeDelta::minutes(10);
/// How long a "no such word" answer is cached.
pub const NOT_FOUND_TTL: Months = Months::new(1);
/// How long definitions are cached. They rarely change.
pub const FOUND_TTL: Months = Months::new(12);
/// How far a stale entry's expiry is pushed when it is served, so that the
/// queries arriving during a refresh do not all trigger another one.
pub const GRACE_WINDOW: TimeDelta = TimeDelta::minutes(1);

/// One part-of-speech / definition pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meaning {
    /// e.g. "noun", "verb".
    pub part_of_speech: String,
    /// The first definition given for that part of speech.
    pub definition: String,
}

impl Meaning {
    /// Creates a meaning pair.
    pub fn new(part_of_speech: impl Into<String>, definition: impl Into<String>) -> Self {
        Self {
            part_of_speech: part_of_speech.into(),
            definition: definition.into(),
        }
    }
}

/// # Entry
///
/// A cached lookup result for one lower-cased word.
///
/// `valid == false` marks a placeholder written after a failed fetch; for such
/// entries `found` is always `false`. Every entry carries an expiry, including
/// placeholders, so a failing upstream is retried at a bounded pace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// The normalized word this entry answers for.
    pub word: String,
    /// Definitions in upstream order, one per part of speech.
    pub meanings: Vec<Meaning>,
    /// The lookup completed (whether or not the word exists).
    pub valid: bool,
    /// The word exists upstream. Only meaningful when `valid`.
    pub found: bool,
    /// After this instant the entry is stale and eligible for refresh.
    pub expires_at: DateTime<Utc>,
}

impl Entry {
    /// Placeholder for a failed fetch, expiring after `FAILURE_TTL`.
    pub fn failure(word: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            word: word.into(),
            meanings: Vec::new(),
            valid: false,
            found: false,
            expires_at: now + FAILURE_TTL,
        }
    }

    /// A completed lookup for a word the upstream does not know.
    pub fn not_found(word: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            word: word.into(),
            meanings: Vec::new(),
            valid: true,
            found: false,
            expires_at: add_months(now, NOT_FOUND_TTL),
        }
    }

    /// A completed lookup carrying definitions.
    pub fn found(word: impl Into<String>, meanings: Vec<Meaning>, now: DateTime<Utc>) -> Self {
        Self {
            word: word.into(),
            meanings,
            valid: true,
            found: true,
            expires_at: add_months(now, FOUND_TTL),
        }
    }

    /// True once `now` is past the expiry.
    pub fn is_stale(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    /// True for a valid entry whose word exists upstream.
    pub fn has_definitions(&self) -> bool {
        self.valid && self.found
    }
}

/// Calendar-month arithmetic that saturates instead of failing near the end of time.
fn add_months(now: DateTime<Utc>, months: Months) -> DateTime<Utc> {
    now.checked_add_months(months).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Lower-cases a raw word into its cache key.
pub fn normalize(word: &str) -> String {
    word.to_lowercase()
}
