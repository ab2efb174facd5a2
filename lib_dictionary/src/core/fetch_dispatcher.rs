//! # Fetch Dispatcher
//!
//! The single background worker that refreshes the cache. Query callers hand
//! it words through a one-word hand-off without ever waiting; the worker
//! drains that queue one word at a time, so at most one upstream request is in
//! flight no matter how many callers there are.
//!
//! ## Per-word flow:
//!
//! 1.  **Throttle**: ask the `RateLimiter`. A refusal drops the word: nothing is
//!     cached and nothing is retried. The next query for that word will offer
//!     it again.
//! 2.  **Fetch**: call the `DictionaryApi`.
//! 3.  **Store**: write the resulting entry unconditionally. Failure
//!     placeholders are cached as well, which is what keeps a failing word from
//!     being re-requested on every query.
//! 4.  **Log**: failures are errors; "not found" is normal traffic.
//!
//! ## Hand-off semantics
//!
//! `FetchQueue::try_enqueue` never blocks, and it only succeeds while the
//! worker is idle, waiting for its next word. While a lookup is in flight
//! every offer is dropped; nothing is buffered behind it. There is no per-word
//! de-duplication either: callers see the word still missing and offer it
//! again next time.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::core::cache_store::CacheStore;
use crate::core::rate_limiter::RateLimiter;
use crate::core::stats::DictionaryStats;
use crate::dictionary::apicall::{DictionaryApi, FetchOutcome};

/// Result of offering a word to the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// The worker took the word.
    Accepted,
    /// The worker was busy with another word; the offer was dropped.
    Busy,
    /// The worker has shut down.
    Closed,
}

/// What the worker did with one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatched {
    /// The rate limiter refused; the cache was not touched.
    Throttled,
    /// Definitions were fetched and cached.
    Found,
    /// The word is unknown upstream; cached as such.
    NotFound,
    /// The lookup failed; a placeholder was cached.
    Failed,
    /// The lookup completed but the cache refused the write.
    StoreFailed,
}

/// # Fetch Queue
///
/// The sending half held by the query service. Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct FetchQueue {
    sender: mpsc::Sender<String>,
    idle: Arc<AtomicBool>,
}

impl FetchQueue {
    /// Offers `word` to the worker without waiting.
    ///
    /// Only one caller can claim an idle worker; everyone else gets `Busy`.
    pub fn try_enqueue(&self, word: &str) -> Enqueue {
        if self.sender.is_closed() {
            return Enqueue::Closed;
        }
        if !self.idle.swap(false, Ordering::AcqRel) {
            return Enqueue::Busy;
        }

        match self.sender.try_send(word.to_string()) {
            Ok(()) => Enqueue::Accepted,
            Err(TrySendError::Full(_)) => Enqueue::Busy,
            Err(TrySendError::Closed(_)) => Enqueue::Closed,
        }
    }
}

/// # Fetch Inbox
///
/// The receiving half owned by the worker. Waiting in `recv` is what marks
/// the worker idle.
#[derive(Debug)]
pub struct FetchInbox {
    receiver: mpsc::Receiver<String>,
    idle: Arc<AtomicBool>,
}

impl FetchInbox {
    /// Takes the next word, marking the worker idle while it waits.
    ///
    /// Cancel safe: dropping the future loses no word.
    pub async fn recv(&mut self) -> Option<String> {
        match self.receiver.try_recv() {
            Ok(word) => return Some(word),
            Err(TryRecvError::Disconnected) => return None,
            Err(TryRecvError::Empty) => {}
        }

        self.idle.store(true, Ordering::Release);
        self.receiver.recv().await
    }

    /// Refuses all further offers.
    pub fn close(&mut self) {
        self.idle.store(false, Ordering::Release);
        self.receiver.close();
    }
}

/// Creates the hand-off between query callers and the worker.
///
/// The worker counts as idle from the start, so a word offered before it is
/// first polled waits in the single slot.
pub fn fetch_queue() -> (FetchQueue, FetchInbox) {
    let (sender, receiver) = mpsc::channel(1);
    let idle = Arc::new(AtomicBool::new(true));
    (
        FetchQueue {
            sender,
            idle: Arc::clone(&idle),
        },
        FetchInbox { receiver, idle },
    )
}

/// # Fetch Dispatcher
///
/// Owns the upstream client and the rate limiter; shares the cache and the
/// counters with the query service.
#[derive(Debug)]
pub struct FetchDispatcher {
    store: Arc<CacheStore>,
    limiter: RateLimiter,
    api: DictionaryApi,
    stats: Arc<DictionaryStats>,
}

impl FetchDispatcher {
    /// Creates a dispatcher writing into `store`.
    pub fn new(store: Arc<CacheStore>, limiter: RateLimiter, api: DictionaryApi, stats: Arc<DictionaryStats>) -> Self {
        Self {
            store,
            limiter,
            api,
            stats,
        }
    }

    /// Spawns the worker loop on the current tokio runtime.
    pub fn spawn(self, inbox: FetchInbox, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(inbox, shutdown))
    }

    /// # Main Worker Loop
    ///
    /// Processes words until the queue closes or `shutdown` fires. Cancellation
    /// also abandons a lookup that is still waiting on the network; words left
    /// in the queue are dropped with it.
    pub async fn run(self, mut inbox: FetchInbox, shutdown: CancellationToken) {
        log::info!("Dictionary fetch worker started.");

        loop {
            let word = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                next = inbox.recv() => match next {
                    Some(word) => word,
                    None => break,
                },
            };

            tokio::select! {
                biased;
                _ = shutdown.cancelled() => {
                    log::info!("Abandoning in-flight lookup for '{}' on shutdown.", word);
                    break;
                }
                _ = self.process(&word) => {}
            }
        }

        inbox.close();
        log::info!("Dictionary fetch worker stopped.");
    }

    /// Handles one word: throttle, fetch, store, log.
    pub async fn process(&self, word: &str) -> Dispatched {
        if !self.limiter.allow() {
            self.stats.record_rate_limited();
            log::warn!("Dictionary API rate limit exceeded; dropping lookup for '{}'.", word);
            return Dispatched::Throttled;
        }

        let outcome = self.api.fetch(word).await;
        let dispatched = match &outcome {
            FetchOutcome::Found(entry) => {
                self.stats.record_found();
                log::debug!("Fetched {} definition(s) for '{}'.", entry.meanings.len(), word);
                Dispatched::Found
            }
            FetchOutcome::NotFound(_) => {
                self.stats.record_not_found();
                log::debug!("'{}' is not in the dictionary.", word);
                Dispatched::NotFound
            }
            FetchOutcome::Failed { error, .. } => {
                self.stats.record_failure();
                log::error!("Error fetching dictionary API for '{}': {}", word, error);
                Dispatched::Failed
            }
        };

        // Cache every outcome, failures included.
        if let Err(e) = self.store.set(word, outcome.into_entry()) {
            log::error!("Failed to cache lookup for '{}': {}", word, e);
            return Dispatched::StoreFailed;
        }

        dispatched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_offers_accepted_only_while_worker_idle() {
        let (queue, mut inbox) = fetch_queue();

        // Idle from the start: the first word takes the slot.
        assert_eq!(queue.try_enqueue("first"), Enqueue::Accepted);
        assert_eq!(queue.try_enqueue("second"), Enqueue::Busy);

        // Picked up and "in flight": still busy.
        assert_eq!(inbox.recv().await.as_deref(), Some("first"));
        assert_eq!(queue.try_enqueue("third"), Enqueue::Busy);

        // Waiting for work again.
        let waited = tokio::time::timeout(Duration::from_millis(20), inbox.recv()).await;
        assert!(waited.is_err());
        assert_eq!(queue.try_enqueue("fourth"), Enqueue::Accepted);
        assert_eq!(queue.try_enqueue("fifth"), Enqueue::Busy);
        assert_eq!(inbox.recv().await.as_deref(), Some("fourth"));

        drop(inbox);
        assert_eq!(queue.try_enqueue("sixth"), Enqueue::Closed);
    }

    #[tokio::test]
    async fn test_closed_inbox_refuses_offers() {
        let (queue, mut inbox) = fetch_queue();
        inbox.close();
        assert_eq!(queue.try_enqueue("word"), Enqueue::Closed);
    }

    #[tokio::test]
    async fn test_throttled_word_leaves_cache_untouched() {
        let store = Arc::new(CacheStore::new());
        let stats = Arc::new(DictionaryStats::new());
        // Unroutable port: the test must never reach the network.
        let api = DictionaryApi::new("http://127.0.0.1:9/", "test-agent", 1).unwrap();
        let dispatcher = FetchDispatcher::new(Arc::clone(&store), RateLimiter::new(0.0, 0), api, Arc::clone(&stats));

        assert_eq!(dispatcher.process("word").await, Dispatched::Throttled);
        assert!(store.is_empty().unwrap());
        assert_eq!(stats.snapshot().rate_limited, 1);
    }

    #[tokio::test]
    async fn test_worker_stops_on_cancel() {
        let store = Arc::new(CacheStore::new());
        let stats = Arc::new(DictionaryStats::new());
        let api = DictionaryApi::new("http://127.0.0.1:9/", "test-agent", 1).unwrap();
        let dispatcher = FetchDispatcher::new(store, RateLimiter::new(0.0, 0), api, stats);

        let (queue, inbox) = fetch_queue();
        let shutdown = CancellationToken::new();
        let handle = dispatcher.spawn(inbox, shutdown.clone());

        shutdown.cancel();
        handle.await.unwrap();
        assert_eq!(queue.try_enqueue("late"), Enqueue::Closed);
    }
}
