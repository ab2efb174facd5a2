use std::io::BufRead;
use std::sync::Arc;

use anyhow::Result;
use lib_dictionary::Dictionary;
use tokio::io::AsyncWriteExt;
use tokio::sync::{broadcast, mpsc};

/// Reads stdin on a dedicated thread. A blocked read must not hold up
/// runtime shutdown, so the thread is left detached.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(64);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            match line {
                Ok(line) => {
                    if tx.blocking_send(line).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    log::error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }
    });
    rx
}

/// Answers one word per input line. Each answer is its records followed by an
/// empty line, so a found word without meanings is still delimited.
pub async fn run(dictionary: Arc<Dictionary>, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
    let mut lines = spawn_stdin_reader();
    let mut stdout = tokio::io::stdout();

    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                log::info!("Console received shutdown signal.");
                break;
            }
            line = lines.recv() => {
                let Some(line) = line else {
                    log::info!("stdin closed, console stopping.");
                    break;
                };

                let word = line.trim();
                if word.is_empty() {
                    continue;
                }

                match dictionary.query(word) {
                    Ok(records) => {
                        for record in records {
                            stdout.write_all(record.as_bytes()).await?;
                            stdout.write_all(b"\n").await?;
                        }
                    }
                    Err(e) => log::error!("Query for '{}' failed: {}", word, e),
                }
                stdout.write_all(b"\n").await?;
                stdout.flush().await?;
            }
        }
    }

    Ok(())
}
