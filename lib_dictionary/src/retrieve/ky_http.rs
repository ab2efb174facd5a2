//! # HTTP Retrieval Utilities
//!
//! This module provides an asynchronous API client wrapper around `reqwest`.
//! Unlike a typed JSON client it never interprets the body: callers receive the
//! status code and the raw bytes and decide for themselves what a "failure" is,
//! because some upstreams carry meaningful payloads on non-2xx statuses.
//!
//! There is no retry middleware: one call is one outbound request. Throttling
//! and failure caching belong to the caller.

use reqwest::{StatusCode, Url};

use crate::error::{DictionaryError, FetchFailure};

/// A standardized container for raw API responses.
///
/// The body has always been read to the end by the time this is built, which
/// lets the connection go back to the pool.
#[derive(Debug)]
pub struct ApiResponse {
    /// The HTTP status returned by the server.
    pub status: StatusCode,
    /// The complete response body.
    pub body: Vec<u8>,
}

/// A small asynchronous HTTP client bound to one base URL.
///
/// Connection pooling comes from the inner `reqwest::Client`, which is cheap to
/// clone and meant to be shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    /// The underlying pooled client.
    inner: reqwest::Client,
    /// The base URL every request extends with one path segment.
    base_url: Url,
}

impl ApiClient {
    /// Creates a new `ApiClient`.
    ///
    /// # Arguments
    /// * `base_url` - Absolute base URL (e.g. "https://api.example.com/v2/entries/en/").
    /// * `user_agent` - Value of the `User-Agent` header sent with every request.
    /// * `max_idle_per_host` - Idle connections kept alive per upstream host.
    ///
    /// # Errors
    /// Fails if the URL does not parse, cannot carry path segments, or the TLS
    /// backend cannot be initialised.
    pub fn new(base_url: &str, user_agent: &str, max_idle_per_host: usize) -> Result<Self, DictionaryError> {
        let url = Url::parse(base_url)?;
        if url.cannot_be_a_base() {
            return Err(DictionaryError::UnusableBaseUrl(base_url.to_string()));
        }

        // No request timeout: a stuck request is bounded only by the OS.
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .pool_max_idle_per_host(max_idle_per_host)
            .build()
            .map_err(DictionaryError::HttpClient)?;

        Ok(Self {
            inner: client,
            base_url: url,
        })
    }

    /// Builds the absolute URL for one path segment.
    ///
    /// The segment is percent-encoded, so a word such as `a/b` or `what?`
    /// cannot escape into the path or the query string.
    pub fn url_for(&self, segment: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push(segment);
        }
        url
    }

    /// Sends a `GET` for `base_url/<segment>` and drains the whole body.
    ///
    /// # Errors
    /// Returns `FetchFailure::Transport` if the request cannot be sent or the
    /// body cannot be read. Non-2xx statuses are *not* errors here.
    pub async fn get_segment(&self, segment: &str) -> Result<ApiResponse, FetchFailure> {
        let url = self.url_for(segment);
        log::debug!("GET {}", url);

        let response = self.inner.get(url).send().await?;
        let status = response.status();

        // Reading to the end returns the connection to the pool.
        let body = response.bytes().await?.to_vec();

        Ok(ApiResponse { status, body })
    }
}
