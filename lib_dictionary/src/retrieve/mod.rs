//! # Data Retrieval Module
//!
//! Generic HTTP plumbing kept apart from the dictionary logic, so the upstream
//! client only deals with parsing and cache policy.
//!
//! ## Contained Modules:
//!
//! - **`ky_http`**: an `ApiClient` built on `reqwest` that targets one base
//!   URL, appends a path segment per request, sends a fixed user agent and
//!   hands back the raw status and fully drained body.

/// Generic HTTP API client returning raw status and body.
pub mod ky_http;

pub use ky_http::{ApiClient, ApiResponse};
