//! Usage counters stored in the `stats` collection.
//!
//! Three independent integer documents: `searches`, `recipes`, `favorites`.
//! Counter writes are paired with primary mutations sequentially, never
//! transactionally - when a counter write fails after the primary mutation
//! succeeded, the counter drifts from ground truth and stays drifted. The
//! `*_best_effort` helpers encode that contract.

use std::sync::Arc;

use serde::Serialize;
use serde_json::json;

use crate::platform::{DocumentStore, StoreError, collections};

/// The three usage counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    /// Ingredient searches run (including empty and zero-result queries).
    Searches,
    /// Recipes currently stored (adjusted on add and delete).
    Recipes,
    /// Favorite marks across all users.
    Favorites,
}

impl Counter {
    /// Document id of this counter in the `stats` collection.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Searches => "searches",
            Self::Recipes => "recipes",
            Self::Favorites => "favorites",
        }
    }
}

/// A read of all three counters.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CounterSnapshot {
    /// Total searches run.
    pub searches: i64,
    /// Total recipes (modulo drift).
    pub recipes: i64,
    /// Total favorite marks (modulo drift).
    pub favorites: i64,
}

/// Typed access to the counter documents.
#[derive(Clone)]
pub struct CounterStore {
    store: Arc<dyn DocumentStore>,
}

impl CounterStore {
    /// Create a counter store over the shared platform handle.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Read a counter. A missing document reads as 0.
    ///
    /// # Errors
    ///
    /// Returns a store error if the platform is unreachable.
    pub async fn read(&self, counter: Counter) -> Result<i64, StoreError> {
        let doc = self.store.get(collections::STATS, counter.as_str()).await?;
        Ok(doc
            .and_then(|doc| doc.fields.get("count").and_then(serde_json::Value::as_i64))
            .unwrap_or(0))
    }

    /// Read all three counters.
    ///
    /// # Errors
    ///
    /// Returns a store error if any read fails.
    pub async fn read_all(&self) -> Result<CounterSnapshot, StoreError> {
        Ok(CounterSnapshot {
            searches: self.read(Counter::Searches).await?,
            recipes: self.read(Counter::Recipes).await?,
            favorites: self.read(Counter::Favorites).await?,
        })
    }

    /// Add one to a counter, creating it at 1 if absent.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    pub async fn increment(&self, counter: Counter) -> Result<(), StoreError> {
        self.adjust(counter, 1, 1).await
    }

    /// Subtract one from a counter, creating it at 0 if absent.
    ///
    /// # Errors
    ///
    /// Returns a store error if the write fails.
    pub async fn decrement(&self, counter: Counter) -> Result<(), StoreError> {
        self.adjust(counter, -1, 0).await
    }

    /// Increment, logging and swallowing failure. The primary mutation has
    /// already succeeded by the time this runs; the count drifts instead of
    /// the operation failing.
    pub async fn increment_best_effort(&self, counter: Counter) {
        if let Err(err) = self.increment(counter).await {
            tracing::warn!(
                counter = counter.as_str(),
                error = %err,
                "counter increment failed; count now drifts from ground truth"
            );
        }
    }

    /// Decrement, logging and swallowing failure.
    pub async fn decrement_best_effort(&self, counter: Counter) {
        if let Err(err) = self.decrement(counter).await {
            tracing::warn!(
                counter = counter.as_str(),
                error = %err,
                "counter decrement failed; count now drifts from ground truth"
            );
        }
    }

    /// A missing counter document is seeded with `missing` rather than
    /// incremented from an implicit zero, matching the platform's
    /// update-requires-existing semantics.
    async fn adjust(&self, counter: Counter, delta: i64, missing: i64) -> Result<(), StoreError> {
        let id = counter.as_str();
        match self.store.get(collections::STATS, id).await? {
            None => {
                self.store
                    .set(collections::STATS, id, json!({ "count": missing }))
                    .await
            }
            Some(_) => {
                self.store
                    .increment(collections::STATS, id, "count", delta)
                    .await
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use crate::platform::MemoryStore;

    use super::*;

    fn counters() -> CounterStore {
        CounterStore::new(Arc::new(MemoryStore::new()))
    }

    #[tokio::test]
    async fn test_missing_counter_reads_zero() {
        let counters = counters();
        assert_eq!(counters.read(Counter::Searches).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_increment_seeds_missing_counter_at_one() {
        let counters = counters();
        counters.increment(Counter::Searches).await.unwrap();
        assert_eq!(counters.read(Counter::Searches).await.unwrap(), 1);

        counters.increment(Counter::Searches).await.unwrap();
        assert_eq!(counters.read(Counter::Searches).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_decrement_seeds_missing_counter_at_zero() {
        let counters = counters();
        counters.decrement(Counter::Recipes).await.unwrap();
        assert_eq!(counters.read(Counter::Recipes).await.unwrap(), 0);

        // An existing counter decrements normally, and may go negative -
        // drift is accepted, not clamped.
        counters.decrement(Counter::Recipes).await.unwrap();
        assert_eq!(counters.read(Counter::Recipes).await.unwrap(), -1);
    }

    #[tokio::test]
    async fn test_counters_are_independent() {
        let counters = counters();
        counters.increment(Counter::Searches).await.unwrap();
        counters.increment(Counter::Favorites).await.unwrap();
        counters.increment(Counter::Favorites).await.unwrap();

        let snapshot = counters.read_all().await.unwrap();
        assert_eq!(snapshot.searches, 1);
        assert_eq!(snapshot.recipes, 0);
        assert_eq!(snapshot.favorites, 2);
    }
}
