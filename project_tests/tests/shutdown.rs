//! Graceful shutdown of the fetch worker.

use chrono::Utc;
use lib_dictionary::{Dictionary, Entry, Meaning};
use project_tests::{options_for, pending_line, MockUpstream};

#[tokio::test]
async fn test_cache_still_served_after_shutdown() {
    let upstream = MockUpstream::start().await;
    upstream.respond_found("late", &[("adjective", "After the expected time.")]);
    let dictionary = Dictionary::new(options_for(&upstream.base_url())).unwrap();
    dictionary
        .cache()
        .set("kept", Entry::found("kept", vec![Meaning::new("verb", "Retained.")], Utc::now()))
        .unwrap();

    dictionary.shutdown().await.unwrap();

    assert_eq!(
        dictionary.query("kept").unwrap(),
        vec![r#"kept 1 TXT "verb:" "Retained.""#.to_string()]
    );

    // Misses still answer, but nothing fetches them any more.
    assert_eq!(dictionary.query("late").unwrap(), vec![pending_line("late")]);
    let stats = dictionary.stats();
    assert_eq!(stats.enqueue_attempts, 1);
    assert_eq!(stats.enqueue_dropped, 1);

    tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    assert!(!dictionary.cache().contains("late").unwrap());
    assert_eq!(upstream.hits("late"), 0);
}

#[tokio::test]
async fn test_shutdown_twice_is_harmless() {
    let upstream = MockUpstream::start().await;
    let dictionary = Dictionary::new(options_for(&upstream.base_url())).unwrap();

    dictionary.shutdown().await.unwrap();
    dictionary.shutdown().await.unwrap();
}
