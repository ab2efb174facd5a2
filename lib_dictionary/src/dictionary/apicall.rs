//! # Dictionary API Client
//!
//! Issues one request per word against the upstream dictionary and turns the
//! answer into a cache `Entry` with the matching expiry.
//!
//! ## Response handling (in order):
//! 1.  Transport errors, 5xx and 429 become a failure placeholder.
//! 2.  A JSON object with a string `title` is the "no definitions" shape. The
//!     upstream sends it with a 404, so statuses are not rejected wholesale.
//! 3.  Otherwise the body must be an array of word-sense groups. Only the first
//!     group is used, and only the first definition of each distinct part of
//!     speech survives, to keep the rendered records small.

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use crate::dictionary::model::{Entry, Meaning};
use crate::error::{DictionaryError, FetchFailure};
use crate::retrieve::ky_http::ApiClient;

/// Public dictionary endpoint; the word is appended as the last path segment.
pub const DEFAULT_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en/";

#[derive(Debug, Deserialize)]
struct WordData {
    #[serde(default)]
    meanings: Vec<MeaningData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MeaningData {
    #[serde(default)]
    part_of_speech: String,
    #[serde(default)]
    definitions: Vec<DefinitionData>,
}

#[derive(Debug, Deserialize)]
struct DefinitionData {
    #[serde(default)]
    definition: String,
}

/// # Fetch Outcome
///
/// The tagged result of one lookup. Every variant carries the entry to cache;
/// failures are cached too so a broken upstream is not hammered.
#[derive(Debug)]
pub enum FetchOutcome {
    /// The word exists; definitions are cached for a long time.
    Found(Entry),
    /// The upstream does not know the word. Expected traffic, not an error.
    NotFound(Entry),
    /// The lookup failed; `placeholder` is a short-lived invalid entry.
    Failed {
        /// Entry to cache in place of a real answer.
        placeholder: Entry,
        /// What went wrong, for the logs.
        error: FetchFailure,
    },
}

impl FetchOutcome {
    /// The entry to write into the cache.
    pub fn entry(&self) -> &Entry {
        match self {
            FetchOutcome::Found(entry) | FetchOutcome::NotFound(entry) => entry,
            FetchOutcome::Failed { placeholder, .. } => placeholder,
        }
    }

    /// Consumes the outcome, keeping only the entry.
    pub fn into_entry(self) -> Entry {
        match self {
            FetchOutcome::Found(entry) | FetchOutcome::NotFound(entry) => entry,
            FetchOutcome::Failed { placeholder, .. } => placeholder,
        }
    }

    /// The failure, if this lookup failed.
    pub fn error(&self) -> Option<&FetchFailure> {
        match self {
            FetchOutcome::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    fn failed(word: &str, now: DateTime<Utc>, error: FetchFailure) -> Self {
        FetchOutcome::Failed {
            placeholder: Entry::failure(word, now),
            error,
        }
    }
}

/// # Dictionary API
///
/// The remote lookup client. Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct DictionaryApi {
    client: ApiClient,
}

impl DictionaryApi {
    /// Builds a client for `api_url` sending `user_agent` on every request.
    pub fn new(api_url: &str, user_agent: &str, max_idle_per_host: usize) -> Result<Self, DictionaryError> {
        Ok(Self {
            client: ApiClient::new(api_url, user_agent, max_idle_per_host)?,
        })
    }

    /// Looks up one already-normalized word.
    pub async fn fetch(&self, word: &str) -> FetchOutcome {
        match self.client.get_segment(word).await {
            Ok(response) => parse_response(word, response.status, &response.body, Utc::now()),
            Err(error) => FetchOutcome::failed(word, Utc::now(), error),
        }
    }
}

/// Maps a raw upstream answer to an outcome. `now` anchors the expiry.
pub fn parse_response(word: &str, status: StatusCode, body: &[u8], now: DateTime<Utc>) -> FetchOutcome {
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        return FetchOutcome::failed(word, now, FetchFailure::UpstreamStatus(status.as_u16()));
    }

    let value: Value = match serde_json::from_slice(body) {
        Ok(value) => value,
        Err(e) => return FetchOutcome::failed(word, now, FetchFailure::Malformed(e)),
    };

    if is_not_found_shape(&value) {
        return FetchOutcome::NotFound(Entry::not_found(word, now));
    }

    let groups: Vec<WordData> = match serde_json::from_value(value) {
        Ok(groups) => groups,
        Err(e) => return FetchOutcome::failed(word, now, FetchFailure::Malformed(e)),
    };

    let meanings = groups.into_iter().next().map(first_definitions).unwrap_or_default();
    FetchOutcome::Found(Entry::found(word, meanings, now))
}

fn is_not_found_shape(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|obj| obj.get("title"))
        .is_some_and(Value::is_string)
}

/// Keeps the first definition of each distinct part of speech, in order.
fn first_definitions(group: WordData) -> Vec<Meaning> {
    let mut meanings: Vec<Meaning> = Vec::with_capacity(group.meanings.len());

    for meaning in group.meanings {
        if meanings.iter().any(|m| m.part_of_speech == meaning.part_of_speech) {
            continue;
        }
        let Some(first) = meaning.definitions.into_iter().next() else {
            continue;
        };
        meanings.push(Meaning::new(meaning.part_of_speech, first.definition.trim()));
    }

    meanings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, 8, 30, 0).unwrap()
    }

    fn body(value: Value) -> Vec<u8> {
        serde_json::to_vec(&value).unwrap()
    }

    #[test]
    fn test_found_keeps_first_definition_per_part_of_speech() {
        let payload = body(json!([
            {
                "word": "run",
                "meanings": [
                    {"partOfSpeech": "verb", "definitions": [
                        {"definition": "  To move swiftly.  "},
                        {"definition": "To flee."}
                    ]},
                    {"partOfSpeech": "noun", "definitions": [
                        {"definition": "An act of running."},
                        {"definition": "A trip."}
                    ]},
                    {"partOfSpeech": "verb", "definitions": [
                        {"definition": "To operate a machine."}
                    ]}
                ]
            },
            {
                "word": "run",
                "meanings": [{"partOfSpeech": "adjective", "definitions": [{"definition": "Melted."}]}]
            }
        ]));

        let entry = match parse_response("run", StatusCode::OK, &payload, now()) {
            FetchOutcome::Found(entry) => entry,
            other => panic!("expected Found, got {:?}", other),
        };

        assert!(entry.valid && entry.found);
        assert_eq!(
            entry.meanings,
            vec![
                Meaning::new("verb", "To move swiftly."),
                Meaning::new("noun", "An act of running."),
            ]
        );
        assert_eq!(entry.expires_at, Utc.with_ymd_and_hms(2025, 3, 10, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_found_skips_parts_of_speech_without_definitions() {
        let payload = body(json!([{
            "word": "odd",
            "meanings": [
                {"partOfSpeech": "noun", "definitions": []},
                {"partOfSpeech": "adjective", "definitions": [{"definition": "Strange."}]},
                {"partOfSpeech": "noun", "definitions": [{"definition": "An odd thing."}]}
            ]
        }]));

        let entry = parse_response("odd", StatusCode::OK, &payload, now()).into_entry();
        assert_eq!(
            entry.meanings,
            vec![Meaning::new("adjective", "Strange."), Meaning::new("noun", "An odd thing.")]
        );
    }

    #[test]
    fn test_empty_array_is_found_without_meanings() {
        let entry = parse_response("x", StatusCode::OK, b"[]", now()).into_entry();
        assert!(entry.valid && entry.found);
        assert!(entry.meanings.is_empty());
    }

    #[test]
    fn test_not_found_shape_on_404() {
        let payload = body(json!({
            "title": "No Definitions Found",
            "message": "Sorry pal, we couldn't find definitions for the word you were looking for.",
            "resolution": "You can try the search again at later time or head to the web instead."
        }));

        let outcome = parse_response("qwzx", StatusCode::NOT_FOUND, &payload, now());
        assert!(matches!(outcome, FetchOutcome::NotFound(_)));
        assert!(outcome.error().is_none());

        let entry = outcome.into_entry();
        assert!(entry.valid);
        assert!(!entry.found);
        assert_eq!(entry.expires_at, Utc.with_ymd_and_hms(2024, 4, 10, 8, 30, 0).unwrap());
    }

    #[test]
    fn test_server_errors_and_throttling_are_failures() {
        let payload = body(json!({"title": "ignored"}));
        for status in [StatusCode::INTERNAL_SERVER_ERROR, StatusCode::BAD_GATEWAY, StatusCode::TOO_MANY_REQUESTS] {
            let outcome = parse_response("word", status, &payload, now());
            assert!(
                matches!(outcome.error(), Some(FetchFailure::UpstreamStatus(code)) if *code == status.as_u16()),
                "status {} should fail, got {:?}",
                status,
                outcome
            );
            let entry = outcome.into_entry();
            assert!(!entry.valid);
            assert!(!entry.found);
            assert_eq!(entry.expires_at, now() + TimeDelta::minutes(10));
        }
    }

    #[test]
    fn test_malformed_bodies_are_failures() {
        let cases: Vec<Vec<u8>> = vec![
            b"<html>gateway</html>".to_vec(),
            body(json!({"message": "no title here"})),
            body(json!({"title": 42})),
            body(json!("just a string")),
            body(json!([{"meanings": "not a list"}])),
        ];

        for payload in cases {
            let outcome = parse_response("word", StatusCode::OK, &payload, now());
            assert!(
                matches!(outcome.error(), Some(FetchFailure::Malformed(_))),
                "expected malformed for {}, got {:?}",
                String::from_utf8_lossy(&payload),
                outcome
            );
            assert!(!outcome.entry().valid);
        }
    }

    #[test]
    fn test_missing_fields_are_tolerated() {
        let payload = body(json!([{"meanings": [{"definitions": [{"definition": "bare"}]}]}]));
        let entry = parse_response("w", StatusCode::OK, &payload, now()).into_entry();
        assert_eq!(entry.meanings, vec![Meaning::new("", "bare")]);
    }
}
