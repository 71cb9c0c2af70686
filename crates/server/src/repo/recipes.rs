//! Recipe repository: CRUD with the ownership gate, plus the live feed.

use std::sync::Arc;

use chrono::Utc;
use serde_json::{Map, Value};

use cookeasy_core::{RecipeId, UserId};

use crate::error::{AppError, Result};
use crate::models::recipe::{split_list, split_tags};
use crate::models::{NewRecipe, Recipe, RecipePatch};
use crate::ownership::OwnerGate;
use crate::platform::{DocumentStore, StoreError, collections};
use crate::repo::stats::{Counter, CounterStore};
use crate::sort::{self, SortField, SortOrder};
use crate::subscription::Subscription;

/// Repository for recipe documents.
#[derive(Clone)]
pub struct RecipeRepository {
    store: Arc<dyn DocumentStore>,
    counters: CounterStore,
}

impl RecipeRepository {
    /// Create a recipe repository over the shared platform handle.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>, counters: CounterStore) -> Self {
        Self { store, counters }
    }

    /// Create a recipe owned by `owner`.
    ///
    /// Normalizes the raw input (trims the title, splits the comma-separated
    /// lists, lowercases tags), persists, then best-effort increments the
    /// `recipes` counter.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if title, ingredients, or steps are empty after
    /// normalization, or a backend error if the write fails.
    pub async fn add(&self, owner: &UserId, input: NewRecipe) -> Result<Recipe> {
        let title = input.title.trim().to_owned();
        if title.is_empty() {
            return Err(AppError::Validation("title must not be empty".to_owned()));
        }

        let ingredients = split_list(&input.ingredients);
        if ingredients.is_empty() {
            return Err(AppError::Validation(
                "ingredients must not be empty".to_owned(),
            ));
        }

        let steps = split_list(&input.steps);
        if steps.is_empty() {
            return Err(AppError::Validation("steps must not be empty".to_owned()));
        }

        let now = Utc::now();
        let mut recipe = Recipe {
            id: RecipeId::new(""),
            title,
            ingredients,
            steps,
            tags: split_tags(&input.tags),
            owner_id: owner.clone(),
            created_at: now,
            updated_at: now,
        };

        let id = self
            .store
            .insert(collections::RECIPES, recipe.to_fields())
            .await?;
        recipe.id = RecipeId::new(id);

        self.counters.increment_best_effort(Counter::Recipes).await;

        tracing::info!(recipe = %recipe.id, owner = %owner, "recipe added");
        Ok(recipe)
    }

    /// Merge `patch` into the recipe at `id` and refresh `updated_at`.
    ///
    /// Only the owner may update; the owner reference itself is immutable.
    /// Counters are never touched by updates.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no recipe exists at `id`, `Forbidden` if
    /// `caller` is not the owner, `Validation` if a provided field is empty
    /// after normalization, or a backend error.
    pub async fn update(
        &self,
        id: &RecipeId,
        caller: &UserId,
        patch: RecipePatch,
    ) -> Result<Recipe> {
        let existing = self.fetch(id).await?;
        OwnerGate::check(existing.as_ref(), caller).into_result(id.as_str())?;
        // The gate rejected the None case above.
        let mut recipe = existing.ok_or_else(|| AppError::NotFound(format!("recipe {id}")))?;

        let mut fields = Map::new();

        if let Some(raw) = patch.title {
            let title = raw.trim().to_owned();
            if title.is_empty() {
                return Err(AppError::Validation("title must not be empty".to_owned()));
            }
            fields.insert("title".to_owned(), Value::from(title.clone()));
            recipe.title = title;
        }

        if let Some(raw) = patch.ingredients {
            let ingredients = split_list(&raw);
            if ingredients.is_empty() {
                return Err(AppError::Validation(
                    "ingredients must not be empty".to_owned(),
                ));
            }
            fields.insert("ingredients".to_owned(), Value::from(ingredients.clone()));
            recipe.ingredients = ingredients;
        }

        if let Some(raw) = patch.steps {
            let steps = split_list(&raw);
            if steps.is_empty() {
                return Err(AppError::Validation("steps must not be empty".to_owned()));
            }
            fields.insert("steps".to_owned(), Value::from(steps.clone()));
            recipe.steps = steps;
        }

        if let Some(raw) = patch.tags {
            // An empty tag list is valid - it clears the tags.
            let tags = split_tags(&raw);
            fields.insert("tags".to_owned(), Value::from(tags.clone()));
            recipe.tags = tags;
        }

        let now = Utc::now();
        fields.insert(
            "updatedAt".to_owned(),
            serde_json::to_value(now).map_err(StoreError::Parse)?,
        );
        recipe.updated_at = now;

        self.store
            .merge(collections::RECIPES, id.as_str(), Value::Object(fields))
            .await?;

        tracing::info!(recipe = %id, owner = %caller, "recipe updated");
        Ok(recipe)
    }

    /// Delete the recipe at `id`, then best-effort decrement the `recipes`
    /// counter. Only the owner may delete.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no recipe exists at `id`, `Forbidden` if
    /// `caller` is not the owner, or a backend error.
    pub async fn delete(&self, id: &RecipeId, caller: &UserId) -> Result<()> {
        let existing = self.fetch(id).await?;
        OwnerGate::check(existing.as_ref(), caller).into_result(id.as_str())?;

        self.store.delete(collections::RECIPES, id.as_str()).await?;
        self.counters.decrement_best_effort(Counter::Recipes).await;

        tracing::info!(recipe = %id, owner = %caller, "recipe deleted");
        Ok(())
    }

    /// Fetch a single recipe.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails or the document is corrupt.
    pub async fn fetch(&self, id: &RecipeId) -> Result<Option<Recipe>> {
        let doc = self.store.get(collections::RECIPES, id.as_str()).await?;
        doc.map(|doc| Recipe::from_document(&doc).map_err(StoreError::Parse))
            .transpose()
            .map_err(AppError::Backend)
    }

    /// Fetch the full recipe set in the platform's collection order.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails or a document is corrupt.
    pub async fn snapshot(&self) -> Result<Vec<Recipe>> {
        let docs = self.store.list(collections::RECIPES).await?;
        docs.iter()
            .map(|doc| Recipe::from_document(doc).map_err(StoreError::Parse))
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(AppError::Backend)
    }

    /// Fetch the full recipe set ordered by `field` in `order`.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the read fails.
    pub async fn list_all(&self, field: SortField, order: SortOrder) -> Result<Vec<Recipe>> {
        let snapshot = self.snapshot().await?;
        Ok(sort::sort(&snapshot, field, order))
    }

    /// Subscribe to the live recipe feed.
    ///
    /// The feed delivers the full current set immediately and again after
    /// every change to the collection. The returned handle is the disposer.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<Vec<Recipe>> {
        let changes = self.store.watch(collections::RECIPES);
        let repo = self.clone();

        Subscription::spawn(changes, move || {
            let repo = repo.clone();
            async move {
                match repo.snapshot().await {
                    Ok(snapshot) => Some(snapshot),
                    Err(err) => {
                        tracing::warn!(error = %err, "recipe feed refresh failed; delivery skipped");
                        None
                    }
                }
            }
        })
    }
}
