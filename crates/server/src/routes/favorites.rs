//! Favorites route handlers.
//!
//! The toggle composition lives here, at the calling layer: check current
//! membership, apply the ledger change, then the matching counter change.
//! The two writes are sequential, not atomic - a counter failure after a
//! successful membership change leaves the counter drifted, by contract.

use std::collections::HashSet;
use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    response::sse::{Event, Sse},
};
use futures::Stream;
use serde::Serialize;
use tracing::instrument;

use cookeasy_core::RecipeId;

use crate::error::Result;
use crate::middleware::auth::{OptionalUser, RequireUser};
use crate::models::Recipe;
use crate::repo::Counter;
use crate::sort::{SortField, SortOrder};
use crate::state::AppState;

use super::live_feed;

/// Toggle response: the membership state after the toggle.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToggleBody {
    /// The toggled recipe.
    pub recipe_id: RecipeId,
    /// Whether the recipe is now favorited.
    pub favorited: bool,
}

/// The authenticated account's favorite recipes.
///
/// Resolved against the full recipe snapshot, so the order follows the
/// listing order, not favorite-addition order.
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Vec<Recipe>>> {
    let snapshot = state
        .recipes()
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await?;
    let favorites = state.favorites().list_recipes(&user.id, &snapshot).await?;
    Ok(Json(favorites))
}

/// The authenticated account's favorite id set.
#[instrument(skip(state, user))]
pub async fn ids(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<HashSet<RecipeId>>> {
    let ids = state.favorites().list_ids(&user.id).await?;
    Ok(Json(ids))
}

/// Toggle a recipe's favorite status for the authenticated account.
#[instrument(skip(state, user))]
pub async fn toggle(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RequireUser(user): RequireUser,
) -> Result<Json<ToggleBody>> {
    let recipe_id = RecipeId::new(id);
    let current = state.favorites().list_ids(&user.id).await?;

    let favorited = if current.contains(&recipe_id) {
        state.favorites().remove(&user.id, &recipe_id).await?;
        state
            .counters()
            .decrement_best_effort(Counter::Favorites)
            .await;
        false
    } else {
        state
            .favorites()
            .add(&user.id, &user.email, &recipe_id)
            .await?;
        state
            .counters()
            .increment_best_effort(Counter::Favorites)
            .await;
        true
    };

    Ok(Json(ToggleBody {
        recipe_id,
        favorited,
    }))
}

/// Live feed of the favorite id set (SSE).
///
/// An anonymous connection receives one empty set immediately and nothing
/// further, matching the unauthenticated subscription contract.
#[instrument(skip(state, user))]
pub async fn live(
    State(state): State<AppState>,
    OptionalUser(user): OptionalUser,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let subscription = state.favorites().subscribe(user.as_ref().map(|u| &u.id));
    live_feed("favorites", subscription)
}
