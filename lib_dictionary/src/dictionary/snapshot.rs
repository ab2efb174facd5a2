//! # Snapshot Codec
//!
//! Serializes the whole cache map so definitions survive a restart without
//! asking the upstream again. The blob is versioned JSON; it is an internal
//! format, but a dump followed by a load must reproduce every field exactly.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::cache_store::CacheStore;
use crate::dictionary::model::{normalize, Entry};
use crate::error::{DictionaryError, Result};

/// Format version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    entries: &'a HashMap<String, Entry>,
}

#[derive(Deserialize)]
struct SnapshotOwned {
    version: u32,
    entries: HashMap<String, Entry>,
}

/// Encodes the store's entire map under its shared lock.
pub fn dump(store: &CacheStore) -> Result<Vec<u8>> {
    store.with_entries(encode)?
}

/// Decodes `bytes` and replaces the store's contents with it.
///
/// Returns the number of entries now cached. On error the store is unchanged.
pub fn load(store: &CacheStore, bytes: &[u8]) -> Result<usize> {
    let entries = decode(bytes)?;
    store.replace_all(entries)
}

/// Encodes a map of entries.
pub fn encode(entries: &HashMap<String, Entry>) -> Result<Vec<u8>> {
    let snapshot = SnapshotRef {
        version: SNAPSHOT_VERSION,
        entries,
    };
    Ok(serde_json::to_vec(&snapshot)?)
}

/// Decodes a blob written by `encode`.
///
/// Keys are lower-cased on the way in so the cache key invariant holds even
/// for hand-edited or foreign snapshots.
pub fn decode(bytes: &[u8]) -> Result<HashMap<String, Entry>> {
    let snapshot: SnapshotOwned = serde_json::from_slice(bytes)?;
    if snapshot.version != SNAPSHOT_VERSION {
        return Err(DictionaryError::SnapshotVersion(snapshot.version));
    }

    Ok(snapshot
        .entries
        .into_iter()
        .map(|(word, entry)| (normalize(&word), entry))
        .collect())
}

/// Writes a snapshot of `store` to `path`.
///
/// The blob goes to a sibling temp file first and is renamed into place, so a
/// crash mid-write never leaves a truncated snapshot behind.
pub fn save_to_path(store: &CacheStore, path: &Path) -> Result<usize> {
    let (bytes, count) = store.with_entries(|entries| encode(entries).map(|b| (b, entries.len())))??;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, &bytes)?;
    fs::rename(&tmp, path)?;

    log::info!("Saved {} dictionary entries to {}", count, path.display());
    Ok(count)
}

/// Loads the snapshot at `path` into `store`.
///
/// Returns `Ok(None)` when the file does not exist, which is the normal first
/// start.
pub fn load_from_path(store: &CacheStore, path: &Path) -> Result<Option<usize>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::info!("No dictionary snapshot at {}; starting empty.", path.display());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let count = load(store, &bytes)?;
    log::info!("Loaded {} dictionary entries from {}", count, path.display());
    Ok(Some(count))
}
