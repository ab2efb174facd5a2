//! # Core Engine Module
//!
//! The concurrency machinery under the dictionary: everything that decides
//! when the upstream is called and how cached state is shared between the
//! query path and the background worker.
//!
//! ## Core Components:
//!
//! - **`rate_limiter`**: a non-blocking token bucket (10 tokens/s, burst 1 by
//!   default) gating outbound lookups.
//!
//! - **`cache_store`**: the word → entry map behind a reader/writer lock.
//!
//! - **`fetch_dispatcher`**: the single background worker and the drop-on-busy
//!   queue that feeds it.
//!
//! - **`stats`**: lock-free counters for hits, misses, queue pressure and
//!   upstream outcomes.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Non-blocking token bucket.
pub mod rate_limiter;
/// Reader/writer guarded entry map.
pub mod cache_store;
/// Background fetch worker and its hand-off queue.
pub mod fetch_dispatcher;
/// Atomic counters.
pub mod stats;

// --- Public API Re-exports ---
pub use cache_store::CacheStore;
pub use fetch_dispatcher::{fetch_queue, Dispatched, Enqueue, FetchDispatcher, FetchInbox, FetchQueue};
pub use rate_limiter::RateLimiter;
pub use stats::{DictionaryStats, StatsSnapshot};
