//! # Dictionary Module
//!
//! The domain layer on top of `core`.
//!
//! - **`model`**: `Entry`, `Meaning` and the expiry policy.
//! - **`apicall`**: the upstream client and response parsing.
//! - **`service`**: `Dictionary`, the query entry point.
//! - **`render`**: text-record formatting.
//! - **`snapshot`**: dump/load of the whole cache.

/// Cached entry model and TTL constants.
pub mod model;
/// Upstream dictionary client.
pub mod apicall;
/// Query service.
pub mod service;
/// Text-record rendering.
pub mod render;
/// Cache persistence.
pub mod snapshot;

pub use apicall::{DictionaryApi, FetchOutcome, DEFAULT_API_URL};
pub use model::{Entry, Meaning};
pub use service::{Dictionary, DictionaryOptions};
