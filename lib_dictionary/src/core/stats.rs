//! # Dictionary Counters
//!
//! Lock-free counters describing how the cache and the fetch worker behave:
//! how often queries hit, how many refreshes were handed to the worker or
//! dropped, and how the upstream answered. Every counter is an `AtomicU64`
//! updated with `Ordering::Relaxed`; only the eventual totals matter.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// # Dictionary Stats
///
/// Shared through an `Arc` by the query service and the fetch worker.
#[derive(Debug, Default)]
pub struct DictionaryStats {
    hits: AtomicU64,
    stale_hits: AtomicU64,
    misses: AtomicU64,
    enqueue_attempts: AtomicU64,
    enqueue_dropped: AtomicU64,
    rate_limited: AtomicU64,
    fetched_found: AtomicU64,
    fetched_not_found: AtomicU64,
    fetch_failures: AtomicU64,
}

/// A point-in-time copy of every counter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Queries answered from a fresh entry.
    pub hits: u64,
    /// Queries answered from a stale entry (a refresh was requested).
    pub stale_hits: u64,
    /// Queries for words with no entry at all.
    pub misses: u64,
    /// Refresh requests offered to the worker queue.
    pub enqueue_attempts: u64,
    /// Offers refused because the queue was busy or closed.
    pub enqueue_dropped: u64,
    /// Requests the worker dropped because the rate limiter said no.
    pub rate_limited: u64,
    /// Lookups that returned definitions.
    pub fetched_found: u64,
    /// Lookups that reported the word unknown.
    pub fetched_not_found: u64,
    /// Lookups that failed and were cached as placeholders.
    pub fetch_failures: u64,
}

macro_rules! counter {
    ($($name:ident => $field:ident),* $(,)?) => {
        $(
            #[doc = concat!("Increments `", stringify!($field), "`.")]
            pub fn $name(&self) {
                self.$field.fetch_add(1, Ordering::Relaxed);
            }
        )*
    };
}

impl DictionaryStats {
    /// Creates a zeroed set of counters.
    pub fn new() -> Self {
        Self::default()
    }

    counter! {
        record_hit => hits,
        record_stale_hit => stale_hits,
        record_miss => misses,
        record_enqueue_attempt => enqueue_attempts,
        record_enqueue_dropped => enqueue_dropped,
        record_rate_limited => rate_limited,
        record_found => fetched_found,
        record_not_found => fetched_not_found,
        record_failure => fetch_failures,
    }

    /// Reads every counter.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            stale_hits: self.stale_hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            enqueue_attempts: self.enqueue_attempts.load(Ordering::Relaxed),
            enqueue_dropped: self.enqueue_dropped.load(Ordering::Relaxed),
            rate_limited: self.rate_limited.load(Ordering::Relaxed),
            fetched_found: self.fetched_found.load(Ordering::Relaxed),
            fetched_not_found: self.fetched_not_found.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Share of queries that found an entry (fresh or stale).
    pub fn hit_rate(&self) -> f64 {
        let served = (self.hits + self.stale_hits) as f64;
        let total = served + self.misses as f64;
        if total == 0.0 {
            0.0
        } else {
            served / total
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_and_hit_rate() {
        let stats = DictionaryStats::new();
        assert_eq!(stats.snapshot().hit_rate(), 0.0);

        stats.record_hit();
        stats.record_stale_hit();
        stats.record_miss();
        stats.record_miss();
        stats.record_enqueue_attempt();

        let snap = stats.snapshot();
        assert_eq!(snap.hits, 1);
        assert_eq!(snap.stale_hits, 1);
        assert_eq!(snap.misses, 2);
        assert_eq!(snap.enqueue_attempts, 1);
        assert_eq!(snap.hit_rate(), 0.5);
    }
}
