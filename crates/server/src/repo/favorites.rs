//! Favorites ledger: the per-user favorite set on the user's record.
//!
//! The ledger only moves recipe ids in and out of the `favorites` array.
//! Counter pairing belongs to the calling layer (the toggle route), which
//! issues the membership change and the counter change sequentially.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::Utc;

use cookeasy_core::{Email, RecipeId, UserId};

use crate::error::{AppError, Result};
use crate::models::{Recipe, UserRecord};
use crate::platform::{DocumentStore, StoreError, collections};
use crate::subscription::Subscription;

const FAVORITES_FIELD: &str = "favorites";

/// Ledger over the `users` collection.
#[derive(Clone)]
pub struct FavoritesLedger {
    store: Arc<dyn DocumentStore>,
}

impl FavoritesLedger {
    /// Create a ledger over the shared platform handle.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Add `recipe_id` to `user`'s favorite set.
    ///
    /// Creates the user record on first favorite; otherwise an idempotent
    /// array union, so re-adding a present id is a storage-level no-op.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn add(&self, user: &UserId, email: &Email, recipe_id: &RecipeId) -> Result<()> {
        match self.store.get(collections::USERS, user.as_str()).await? {
            None => {
                let fields = UserRecord::initial_fields(email, recipe_id, Utc::now());
                self.store
                    .set(collections::USERS, user.as_str(), fields)
                    .await?;
            }
            Some(_) => {
                self.store
                    .array_union(
                        collections::USERS,
                        user.as_str(),
                        FAVORITES_FIELD,
                        recipe_id.as_str(),
                    )
                    .await?;
            }
        }
        Ok(())
    }

    /// Remove `recipe_id` from `user`'s favorite set. Idempotent: removing
    /// an absent id, or from a user without a record, is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the write fails.
    pub async fn remove(&self, user: &UserId, recipe_id: &RecipeId) -> Result<()> {
        let removal = self
            .store
            .array_remove(
                collections::USERS,
                user.as_str(),
                FAVORITES_FIELD,
                recipe_id.as_str(),
            )
            .await;

        match removal {
            Ok(()) | Err(StoreError::NotFound(_)) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    /// The user's favorite id set. Empty when no record exists.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails or the record is corrupt.
    pub async fn list_ids(&self, user: &UserId) -> Result<HashSet<RecipeId>> {
        let doc = self.store.get(collections::USERS, user.as_str()).await?;
        let Some(doc) = doc else {
            return Ok(HashSet::new());
        };

        let record = UserRecord::from_document(&doc).map_err(StoreError::Parse)?;
        Ok(record.favorites.into_iter().collect())
    }

    /// Resolve the user's favorites against a recipe snapshot. The result
    /// follows the snapshot's order, not favorite-addition order; favorited
    /// ids whose recipe no longer exists simply do not appear.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the id read fails.
    pub async fn list_recipes(&self, user: &UserId, snapshot: &[Recipe]) -> Result<Vec<Recipe>> {
        let ids = self.list_ids(user).await?;
        Ok(snapshot
            .iter()
            .filter(|recipe| ids.contains(&recipe.id))
            .cloned()
            .collect())
    }

    /// Subscribe to the live favorite-id feed for `user`.
    ///
    /// An anonymous subscriber receives one empty set immediately and
    /// nothing further. The change signal covers the whole `users`
    /// collection, so deliveries that would repeat the subscriber's current
    /// set are suppressed.
    #[must_use]
    pub fn subscribe(&self, user: Option<&UserId>) -> Subscription<HashSet<RecipeId>> {
        let Some(user) = user else {
            return Subscription::once(HashSet::new());
        };

        let changes = self.store.watch(collections::USERS);
        let ledger = self.clone();
        let user = user.clone();
        let last_sent: Arc<Mutex<Option<HashSet<RecipeId>>>> = Arc::default();

        Subscription::spawn(changes, move || {
            let ledger = ledger.clone();
            let user = user.clone();
            let last_sent = Arc::clone(&last_sent);
            async move {
                let ids = match ledger.list_ids(&user).await {
                    Ok(ids) => ids,
                    Err(err) => {
                        tracing::warn!(user = %user, error = %err, "favorites feed refresh failed; delivery skipped");
                        return None;
                    }
                };

                #[allow(clippy::unwrap_used)] // Lock is never poisoned: no panics inside
                let mut last_sent = last_sent.lock().unwrap();
                if last_sent.as_ref() == Some(&ids) {
                    return None;
                }
                *last_sent = Some(ids.clone());
                Some(ids)
            }
        })
    }
}
