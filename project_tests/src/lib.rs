//! # Dictionary Test Harness
//!
//! Shared fixtures for the integration tests under `tests/`.
//!
//! `MockUpstream` is a local `axum` server that impersonates the dictionary
//! API: every word gets a canned status and body (404 with the not-found
//! document unless told otherwise) and every request is counted per word, so
//! tests can assert exactly how often the fetch worker went upstream and
//! which `User-Agent` it sent.
//!
//! `StalledUpstream` accepts connections and never answers, which pins the
//! fetch worker on one in-flight lookup.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use serde_json::{json, Value};
use tokio::task::JoinHandle;

use lib_dictionary::{Dictionary, DictionaryOptions, Entry};

const ENTRIES_PATH: &str = "/api/v2/entries/en/";

/// `User-Agent` configured by `options_for`.
pub const TEST_USER_AGENT: &str = "project_tests/0.1";

#[derive(Default)]
struct MockState {
    responses: Mutex<HashMap<String, (StatusCode, String)>>,
    hits: Mutex<HashMap<String, usize>>,
    user_agents: Mutex<HashMap<String, Vec<String>>>,
}

/// # Mock Upstream
///
/// Stops serving when dropped.
pub struct MockUpstream {
    addr: SocketAddr,
    state: Arc<MockState>,
    server: JoinHandle<()>,
}

impl MockUpstream {
    /// Binds an ephemeral port on localhost and starts serving.
    pub async fn start() -> Self {
        let state = Arc::new(MockState::default());
        let app = Router::new()
            .route("/api/v2/entries/en/{word}", get(lookup))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock upstream");
        let addr = listener.local_addr().expect("Mock upstream has no local address");

        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Mock upstream stopped: {}", e);
            }
        });

        Self { addr, state, server }
    }

    /// Base URL to hand to `DictionaryOptions::api_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, ENTRIES_PATH)
    }

    /// Answers `word` with `status` and a raw body.
    pub fn respond(&self, word: &str, status: u16, body: impl Into<String>) {
        let status = StatusCode::from_u16(status).expect("Invalid status code");
        self.state
            .responses
            .lock()
            .unwrap()
            .insert(word.to_string(), (status, body.into()));
    }

    /// Answers `word` with 200 and a found-shape document built from
    /// `(part of speech, definition)` pairs, all in one meaning group.
    pub fn respond_found(&self, word: &str, meanings: &[(&str, &str)]) {
        self.respond(word, 200, found_body(word, meanings).to_string());
    }

    /// Number of upstream requests seen for `word`.
    pub fn hits(&self, word: &str) -> usize {
        self.state.hits.lock().unwrap().get(word).copied().unwrap_or(0)
    }

    /// `User-Agent` of every request for `word`, in arrival order. A request
    /// without the header records an empty string.
    pub fn user_agents(&self, word: &str) -> Vec<String> {
        self.state.user_agents.lock().unwrap().get(word).cloned().unwrap_or_default()
    }
}

impl Drop for MockUpstream {
    fn drop(&mut self) {
        self.server.abort();
    }
}

async fn lookup(State(state): State<Arc<MockState>>, Path(word): Path<String>, headers: HeaderMap) -> Response {
    *state.hits.lock().unwrap().entry(word.clone()).or_insert(0) += 1;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    state.user_agents.lock().unwrap().entry(word.clone()).or_default().push(user_agent);

    let canned = state.responses.lock().unwrap().get(&word).cloned();
    let (status, body) = canned.unwrap_or_else(|| (StatusCode::NOT_FOUND, not_found_body().to_string()));

    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// # Stalled Upstream
///
/// Accepts TCP connections and never writes a byte back.
pub struct StalledUpstream {
    addr: SocketAddr,
    server: JoinHandle<()>,
}

impl StalledUpstream {
    /// Binds an ephemeral port on localhost and starts accepting.
    pub async fn start() -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stalled upstream");
        let addr = listener.local_addr().expect("Stalled upstream has no local address");

        let server = tokio::spawn(async move {
            // Keep every socket open so clients wait on a response forever.
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        });

        Self { addr, server }
    }

    /// Base URL to hand to `DictionaryOptions::api_url`.
    pub fn base_url(&self) -> String {
        format!("http://{}{}", self.addr, ENTRIES_PATH)
    }
}

impl Drop for StalledUpstream {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// The document the real API returns for unknown words.
pub fn not_found_body() -> Value {
    json!({
        "title": "No Definitions Found",
        "message": "Sorry pal, we couldn't find definitions for the word you were looking for.",
        "resolution": "You can try the search again at later time or head to the web instead."
    })
}

/// A found-shape document with one meaning per pair.
pub fn found_body(word: &str, meanings: &[(&str, &str)]) -> Value {
    let meanings: Vec<Value> = meanings
        .iter()
        .map(|(pos, definition)| {
            json!({
                "partOfSpeech": pos,
                "definitions": [{"definition": definition, "synonyms": [], "antonyms": []}],
                "synonyms": [],
                "antonyms": []
            })
        })
        .collect();

    json!([{
        "word": word,
        "phonetics": [],
        "meanings": meanings,
        "license": {"name": "CC BY-SA 3.0", "url": "https://creativecommons.org/licenses/by-sa/3.0"},
        "sourceUrls": [format!("https://en.wiktionary.org/wiki/{}", word)]
    }])
}

/// Options pointing at `base_url` with a limiter loose enough never to throttle.
pub fn options_for(base_url: &str) -> DictionaryOptions {
    DictionaryOptions {
        user_agent: TEST_USER_AGENT.to_string(),
        api_url: base_url.to_string(),
        rate_limit_per_sec: 1000.0,
        rate_limit_burst: 100,
        ..DictionaryOptions::default()
    }
}

/// Expected line for a word whose first fetch is outstanding.
pub fn pending_line(word: &str) -> String {
    format!("{} 1 TXT \"word definition is being fetched. Try again in a few seconds.\"", word)
}

/// Expected line for a word the upstream does not know.
pub fn not_found_line(word: &str) -> String {
    format!(
        "{} 1 TXT \"word definition was not found in our dictionary, please try other sources.\"",
        word
    )
}

/// Expected line for a word whose last fetch failed.
pub fn unavailable_line(word: &str) -> String {
    format!("{} 1 TXT \"dictionary unavailable, try again later.\"", word)
}

/// Polls the cache until `word` has an entry, without issuing queries.
/// Returns `false` after five seconds.
pub async fn wait_until_cached(dictionary: &Dictionary, word: &str) -> bool {
    for _ in 0..500 {
        if dictionary.cache().contains(word).unwrap_or(false) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

/// Polls the cache until `check` holds for the entry of `word`.
/// Returns `false` after five seconds.
pub async fn wait_until(dictionary: &Dictionary, word: &str, check: impl Fn(&Entry) -> bool) -> bool {
    for _ in 0..500 {
        if let Ok(Some(entry)) = dictionary.cache().get(word) {
            if check(&entry) {
                return true;
            }
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
