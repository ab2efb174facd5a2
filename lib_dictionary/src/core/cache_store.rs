//! # Cache Store
//!
//! The word → entry map behind a reader/writer lock. Query lookups and
//! snapshot dumps take the shared lock; fetch results, grace-window bumps and
//! snapshot loads take the exclusive one. The store owns its map outright:
//! callers get clones out and hand values in, never references into the map.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};

use crate::dictionary::model::Entry;
use crate::error::{DictionaryError, Result};

/// # Cache Store
///
/// A thread-safe map from lower-cased word to its latest `Entry`. Writes
/// overwrite, so a key never has two entries.
#[derive(Debug, Default)]
pub struct CacheStore {
    data: RwLock<HashMap<String, Entry>>,
}

impl CacheStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<String, Entry>>> {
        self.data.read().map_err(|_| DictionaryError::CachePoisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<String, Entry>>> {
        self.data.write().map_err(|_| DictionaryError::CachePoisoned)
    }

    /// Returns a copy of the entry for `word`, if any.
    pub fn get(&self, word: &str) -> Result<Option<Entry>> {
        Ok(self.read()?.get(word).cloned())
    }

    /// Inserts or overwrites the entry for `word`.
    pub fn set(&self, word: impl Into<String>, entry: Entry) -> Result<()> {
        self.write()?.insert(word.into(), entry);
        Ok(())
    }

    /// Moves the expiry of `word` to `new_expiry`, but only if the entry still
    /// expires at `observed`. Returns whether the write happened.
    ///
    /// A fetch result that landed after `observed` was read is left alone.
    pub fn extend_expiry(&self, word: &str, observed: DateTime<Utc>, new_expiry: DateTime<Utc>) -> Result<bool> {
        let mut data = self.write()?;
        match data.get_mut(word) {
            Some(entry) if entry.expires_at == observed => {
                entry.expires_at = new_expiry;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// True if `word` has an entry, fresh or stale.
    pub fn contains(&self, word: &str) -> Result<bool> {
        Ok(self.read()?.contains_key(word))
    }

    /// Number of cached words.
    pub fn len(&self) -> Result<usize> {
        Ok(self.read()?.len())
    }

    /// True when nothing is cached.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.read()?.is_empty())
    }

    /// Runs `f` against the whole map under the shared lock.
    ///
    /// Used by the snapshot encoder; the map cannot change while `f` runs.
    pub fn with_entries<T>(&self, f: impl FnOnce(&HashMap<String, Entry>) -> T) -> Result<T> {
        let data = self.read()?;
        Ok(f(&data))
    }

    /// Replaces the whole map, returning how many entries are now cached.
    pub fn replace_all(&self, entries: HashMap<String, Entry>) -> Result<usize> {
        let mut data = self.write()?;
        *data = entries;
        Ok(data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_set_overwrites() {
        let store = CacheStore::new();
        let now = Utc::now();

        store.set("word", Entry::failure("word", now)).unwrap();
        store.set("word", Entry::not_found("word", now)).unwrap();

        assert_eq!(store.len().unwrap(), 1);
        let entry = store.get("word").unwrap().unwrap();
        assert!(entry.valid);
        assert!(store.get("other").unwrap().is_none());
    }

    #[test]
    fn test_extend_expiry_compare_and_set() {
        let store = CacheStore::new();
        let now = Utc::now();
        let stale = Entry::failure("word", now - TimeDelta::hours(1));
        let observed = stale.expires_at;
        store.set("word", stale).unwrap();

        let bumped = now + TimeDelta::minutes(1);
        assert!(store.extend_expiry("word", observed, bumped).unwrap());
        assert_eq!(store.get("word").unwrap().unwrap().expires_at, bumped);

        // A second bump against the old observation is refused.
        assert!(!store.extend_expiry("word", observed, now + TimeDelta::minutes(5)).unwrap());
        assert_eq!(store.get("word").unwrap().unwrap().expires_at, bumped);

        assert!(!store.extend_expiry("missing", observed, bumped).unwrap());
    }

    #[test]
    fn test_replace_all_drops_previous_contents() {
        let store = CacheStore::new();
        let now = Utc::now();
        store.set("old", Entry::failure("old", now)).unwrap();

        let mut fresh = HashMap::new();
        fresh.insert("new".to_string(), Entry::not_found("new", now));
        assert_eq!(store.replace_all(fresh).unwrap(), 1);

        assert!(!store.contains("old").unwrap());
        assert!(store.contains("new").unwrap());
    }

    #[test]
    fn test_with_entries_sees_whole_map() {
        let store = CacheStore::new();
        let now = Utc::now();
        store.set("a", Entry::not_found("a", now)).unwrap();
        store.set("b", Entry::failure("b", now)).unwrap();

        let mut words = store.with_entries(|entries| entries.keys().cloned().collect::<Vec<_>>()).unwrap();
        words.sort();
        assert_eq!(words, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let store = Arc::new(CacheStore::new());
        let now = Utc::now();

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for i in 0..100 {
                        let word = format!("w{}", i % 10);
                        if t % 2 == 0 {
                            store.set(word.clone(), Entry::not_found(word, now)).unwrap();
                        } else {
                            let _ = store.get(&word).unwrap();
                        }
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(store.len().unwrap(), 10);
    }

    #[test]
    fn test_poisoned_lock_is_reported() {
        let store = Arc::new(CacheStore::new());
        let poisoner = Arc::clone(&store);

        let _ = thread::spawn(move || {
            let _guard = poisoner.data.write().unwrap();
            panic!("poison the cache lock");
        })
        .join();

        assert!(matches!(store.get("word"), Err(DictionaryError::CachePoisoned)));
    }
}
