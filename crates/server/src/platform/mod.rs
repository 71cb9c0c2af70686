//! Clients for the hosted platform CookEasy runs on.
//!
//! # Architecture
//!
//! All durable state lives off-process, in two external services:
//!
//! - A **document platform** holding the `recipes`, `users`, and `stats`
//!   collections. Consumed through the [`DocumentStore`] trait so the
//!   service logic never sees a concrete client: production uses
//!   [`HttpStore`], tests and local development use [`MemoryStore`].
//! - An **identity service** owning accounts and credentials, consumed
//!   through [`IdentityClient`]. This service never stores passwords or
//!   mints tokens itself.
//!
//! The store trait also carries the live-change signal: `watch(collection)`
//! returns a channel receiver that is bumped whenever the collection
//! changes, which the repository layer turns into full-snapshot
//! subscriptions.

mod http;
mod identity;
mod memory;
mod store;

pub use http::HttpStore;
pub use identity::{AuthSession, IdentityClient, IdentityError};
pub use memory::MemoryStore;
pub use store::{Document, DocumentStore, collections};

use thiserror::Error;

/// Errors that can occur when talking to the document platform.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response was received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The platform returned a non-success status.
    #[error("platform returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// Response body could not be decoded.
    #[error("response parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The addressed document does not exist.
    #[error("document not found: {0}")]
    NotFound(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_display() {
        let err = StoreError::NotFound("recipes/r1".to_string());
        assert_eq!(err.to_string(), "document not found: recipes/r1");

        let err = StoreError::Status {
            status: 503,
            body: "unavailable".to_string(),
        };
        assert_eq!(err.to_string(), "platform returned 503: unavailable");
    }
}
