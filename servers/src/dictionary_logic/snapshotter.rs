use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use lib_dictionary::Dictionary;
use tokio::sync::broadcast;
use tokio::time::interval;

/// Writes the cache to `path`. Success is logged by the library.
pub fn save(dictionary: &Dictionary, path: &Path) {
    if let Err(e) = dictionary.save_snapshot(path) {
        log::error!("Failed to save snapshot to {}: {}", path.display(), e);
    }
}

/// Restores the cache from `path` if a snapshot exists there. An unreadable
/// snapshot is skipped and the server starts empty.
pub fn restore(dictionary: &Dictionary, path: &Path) {
    if let Err(e) = dictionary.load_snapshot(path) {
        log::warn!("Ignoring unreadable snapshot {}: {}", path.display(), e);
    }
}

pub async fn run(
    dictionary: Arc<Dictionary>,
    path: PathBuf,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) {
    let mut ticker = interval(every);
    // The first tick completes immediately; nothing has changed yet.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Snapshot service received shutdown signal.");
                break;
            }
            _ = ticker.tick() => save(&dictionary, &path),
        }
    }
}
