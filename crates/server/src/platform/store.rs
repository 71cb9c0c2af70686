//! The `DocumentStore` trait - the seam to the hosted document platform.

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::watch;

use super::StoreError;

/// Collection names on the document platform.
pub mod collections {
    /// Recipe documents.
    pub const RECIPES: &str = "recipes";
    /// Per-user records (email + favorites set).
    pub const USERS: &str = "users";
    /// Usage counters (`searches`, `recipes`, `favorites`).
    pub const STATS: &str = "stats";
}

/// A document fetched from the platform: its opaque id plus its fields
/// as untyped JSON. Typed conversion happens in the model layer.
#[derive(Debug, Clone)]
pub struct Document {
    /// Platform-assigned opaque identifier.
    pub id: String,
    /// Document fields.
    pub fields: Value,
}

/// Access to the hosted document platform.
///
/// Every operation is a single-document atomic write or a read; there is no
/// multi-document transaction. Callers that need a pair of writes (recipe +
/// counter, favorite + counter) issue them sequentially and accept drift if
/// the second write fails.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a document with a platform-assigned id. Returns the new id.
    async fn insert(&self, collection: &str, fields: Value) -> Result<String, StoreError>;

    /// Fetch a single document. Returns `None` if it does not exist.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or fully replace a document at a caller-chosen id.
    async fn set(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError>;

    /// Merge fields into an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn merge(&self, collection: &str, id: &str, fields: Value) -> Result<(), StoreError>;

    /// Delete a document. Deleting a missing document is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;

    /// Fetch every document in a collection.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Fetch the documents whose array field contains `value` exactly.
    async fn query_array_contains(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<Document>, StoreError>;

    /// Atomically add `delta` to an integer field of an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn increment(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        delta: i64,
    ) -> Result<(), StoreError>;

    /// Add `value` to an array field if not already present (idempotent).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn array_union(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Remove every occurrence of `value` from an array field (idempotent;
    /// removing an absent value is a no-op).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the document does not exist.
    async fn array_remove(
        &self,
        collection: &str,
        id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), StoreError>;

    /// Subscribe to the change signal for a collection.
    ///
    /// The returned receiver observes a version counter that is bumped on
    /// every change to the collection. It carries no data - consumers
    /// re-read the collection when it fires.
    fn watch(&self, collection: &str) -> watch::Receiver<u64>;

    /// Verify the platform is reachable (used by the readiness probe).
    async fn ping(&self) -> Result<(), StoreError>;
}
