//! # lib_dictionary
//!
//! Word-definition lookups backed by a remote dictionary service and served as
//! short text records. Callers never wait on the network: cached entries are
//! rendered immediately, while missing or stale words are handed to a single
//! background worker that refreshes the cache within a rate limit.
//!
//! ## Layout
//!
//! - **`core`**: the concurrency primitives (token bucket, guarded cache map,
//!   fetch worker, counters).
//! - **`dictionary`**: the domain layer (entry model, upstream client and
//!   body parsing, query service, snapshot codec).
//! - **`retrieve`**: the thin HTTP client the upstream client is built on.
//! - **`configs`** / **`loggers`**: runtime configuration and log sinks, gated
//!   behind features of the same name.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

/// Error types shared across the crate.
pub mod error;
/// Rate limiter, cache store, fetch dispatcher and counters.
pub mod core;
/// Entry model, upstream client, query service and snapshot codec.
pub mod dictionary;
/// Generic HTTP retrieval client.
pub mod retrieve;

/// Layered runtime configuration.
#[cfg(feature = "configs")]
pub mod configs;
/// Log sink setup.
#[cfg(feature = "loggers")]
pub mod loggers;

// --- Public API Re-exports ---
pub use crate::core::{CacheStore, DictionaryStats, RateLimiter, StatsSnapshot};
pub use crate::dictionary::{Dictionary, DictionaryOptions, Entry, FetchOutcome, Meaning};
pub use crate::error::{DictionaryError, FetchFailure};
