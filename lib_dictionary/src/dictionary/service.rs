//! # Dictionary Query Service
//!
//! The public face of the crate. `query` never waits on the network:
//!
//! - **Fresh entry**: rendered straight away.
//! - **Stale entry**: a refresh is offered to the worker, the expiry is pushed
//!   out by the grace window, and the old entry is rendered straight away.
//! - **No entry**: a refresh is offered and a single "being fetched" line is
//!   returned.
//!
//! Upstream problems never surface here; they show up as the cached
//! "unavailable" placeholder. The only errors `query` returns are internal
//! (a poisoned cache lock).

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::cache_store::CacheStore;
use crate::core::fetch_dispatcher::{fetch_queue, Enqueue, FetchDispatcher, FetchQueue};
use crate::core::rate_limiter::{RateLimiter, DEFAULT_BURST, DEFAULT_RATE_PER_SEC};
use crate::core::stats::{DictionaryStats, StatsSnapshot};
use crate::dictionary::apicall::{DictionaryApi, DEFAULT_API_URL};
use crate::dictionary::model::{normalize, Entry, GRACE_WINDOW};
use crate::dictionary::render;
use crate::dictionary::snapshot;
use crate::error::{DictionaryError, Result};

/// # Dictionary Options
///
/// Everything the dictionary needs from its host process.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct DictionaryOptions {
    /// `User-Agent` header sent with every upstream request.
    pub user_agent: String,
    /// Upstream base URL; the word is appended as the last path segment.
    pub api_url: String,
    /// Outbound lookups allowed per second.
    pub rate_limit_per_sec: f64,
    /// Lookups allowed back to back before the rate applies.
    pub rate_limit_burst: u32,
    /// Idle upstream connections kept in the pool.
    pub max_idle_per_host: usize,
}

impl Default for DictionaryOptions {
    fn default() -> Self {
        Self {
            user_agent: concat!("lib_dictionary/", env!("CARGO_PKG_VERSION")).to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            rate_limit_per_sec: DEFAULT_RATE_PER_SEC,
            rate_limit_burst: DEFAULT_BURST,
            max_idle_per_host: 10,
        }
    }
}

/// What the cache said about a word.
enum Lookup {
    /// Nothing cached; a fetch was offered.
    Pending,
    /// Something cached (possibly stale, already grace-extended).
    Cached(Entry),
}

/// # Dictionary
///
/// Owns the cache, the hand-off queue and the background worker.
#[derive(Debug)]
pub struct Dictionary {
    store: Arc<CacheStore>,
    queue: FetchQueue,
    stats: Arc<DictionaryStats>,
    shutdown: CancellationToken,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Dictionary {
    /// Creates a dictionary and spawns its fetch worker.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    /// Fails if the upstream URL is unusable or the HTTP client cannot be built.
    pub fn new(options: DictionaryOptions) -> Result<Self> {
        let api = DictionaryApi::new(&options.api_url, &options.user_agent, options.max_idle_per_host)?;
        let limiter = RateLimiter::new(options.rate_limit_per_sec, options.rate_limit_burst);

        let store = Arc::new(CacheStore::new());
        let stats = Arc::new(DictionaryStats::new());
        let (queue, inbox) = fetch_queue();
        let shutdown = CancellationToken::new();

        let dispatcher = FetchDispatcher::new(Arc::clone(&store), limiter, api, Arc::clone(&stats));
        let worker = dispatcher.spawn(inbox, shutdown.clone());

        Ok(Self {
            store,
            queue,
            stats,
            shutdown,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Answers a query with text-record lines.
    ///
    /// The word is lower-cased first. A word seen for the first time yields a
    /// single pending line and schedules a fetch.
    pub fn query(&self, raw_word: &str) -> Result<Vec<String>> {
        let word = normalize(raw_word);

        match self.lookup(&word)? {
            Lookup::Pending => Ok(vec![render::pending(&word)]),
            Lookup::Cached(entry) => Ok(render::entry(&word, &entry)),
        }
    }

    fn lookup(&self, word: &str) -> Result<Lookup> {
        let now = Utc::now();

        let Some(mut entry) = self.store.get(word)? else {
            self.stats.record_miss();
            self.offer(word);
            return Ok(Lookup::Pending);
        };

        if !entry.is_stale(now) {
            self.stats.record_hit();
            return Ok(Lookup::Cached(entry));
        }

        self.stats.record_stale_hit();
        self.offer(word);

        // Serve the old answer, and keep further queries from re-offering the
        // word until the refresh has had a chance to land.
        let extended = now + GRACE_WINDOW;
        if self.store.extend_expiry(word, entry.expires_at, extended)? {
            entry.expires_at = extended;
        }
        Ok(Lookup::Cached(entry))
    }

    fn offer(&self, word: &str) {
        self.stats.record_enqueue_attempt();
        match self.queue.try_enqueue(word) {
            Enqueue::Accepted => log::debug!("Queued '{}' for fetch.", word),
            Enqueue::Busy => self.stats.record_enqueue_dropped(),
            Enqueue::Closed => {
                self.stats.record_enqueue_dropped();
                log::debug!("Fetch worker is stopped; not queueing '{}'.", word);
            }
        }
    }

    /// Serializes the whole cache.
    pub fn dump(&self) -> Result<Vec<u8>> {
        snapshot::dump(&self.store)
    }

    /// Replaces the cache with a blob produced by `dump`.
    pub fn load(&self, bytes: &[u8]) -> Result<usize> {
        snapshot::load(&self.store, bytes)
    }

    /// Writes the cache to `path` atomically.
    pub fn save_snapshot(&self, path: &Path) -> Result<usize> {
        snapshot::save_to_path(&self.store, path)
    }

    /// Restores the cache from `path`; `Ok(None)` if the file does not exist.
    pub fn load_snapshot(&self, path: &Path) -> Result<Option<usize>> {
        snapshot::load_from_path(&self.store, path)
    }

    /// Read access to the cache, for inspection.
    pub fn cache(&self) -> &CacheStore {
        &self.store
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Stops the fetch worker and waits for it to exit.
    ///
    /// A lookup in flight is abandoned and queued words are dropped. The cache
    /// stays readable; later misses are answered with the pending line but
    /// nothing will fetch them. Calling this twice is harmless.
    pub async fn shutdown(&self) -> Result<()> {
        self.shutdown.cancel();

        let handle = self.worker.lock().unwrap_or_else(PoisonError::into_inner).take();
        if let Some(handle) = handle {
            handle.await.map_err(|e| DictionaryError::WorkerStopped(e.to_string()))?;
        }
        Ok(())
    }
}

impl Drop for Dictionary {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
