//! Recipe route handlers.

use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::sse::{Event, Sse},
};
use futures::Stream;
use serde::Deserialize;
use tracing::instrument;

use cookeasy_core::RecipeId;

use crate::error::Result;
use crate::middleware::auth::RequireUser;
use crate::models::{NewRecipe, Recipe, RecipePatch};
use crate::repo::Counter;
use crate::search;
use crate::sort::{SortField, SortOrder};
use crate::state::AppState;

use super::live_feed;

/// Listing query parameters.
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Sort field: `createdAt` (default), `title`, or `tag`.
    #[serde(default)]
    pub sort: String,
    /// Sort order: `asc` or `desc` (default).
    #[serde(default)]
    pub order: String,
}

/// Ingredient search query parameters.
#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    /// Free-text comma-separated ingredient list.
    #[serde(default)]
    pub q: String,
}

/// Full recipe listing, sorted.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Recipe>>> {
    let field = SortField::parse(&query.sort);
    let order = SortOrder::parse(&query.order);
    let recipes = state.recipes().list_all(field, order).await?;
    Ok(Json(recipes))
}

/// Add a recipe owned by the authenticated account.
#[instrument(skip(state, user, input))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(input): Json<NewRecipe>,
) -> Result<(StatusCode, Json<Recipe>)> {
    let recipe = state.recipes().add(&user.id, input).await?;
    Ok((StatusCode::CREATED, Json(recipe)))
}

/// Update a recipe. Owner only.
#[instrument(skip(state, user, patch))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RequireUser(user): RequireUser,
    Json(patch): Json<RecipePatch>,
) -> Result<Json<Recipe>> {
    let recipe = state
        .recipes()
        .update(&RecipeId::new(id), &user.id, patch)
        .await?;
    Ok(Json(recipe))
}

/// Delete a recipe. Owner only.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    state.recipes().delete(&RecipeId::new(id), &user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Ingredient-overlap search.
///
/// Every invocation counts as one search - empty queries and zero-result
/// queries included. The counter write is best-effort and never fails the
/// search itself.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Recipe>>> {
    state
        .counters()
        .increment_best_effort(Counter::Searches)
        .await;

    let tokens = search::parse_query(&query.q);
    let snapshot = state
        .recipes()
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await?;

    Ok(Json(search::search_by_ingredients(&snapshot, &tokens)))
}

/// Exact tag filter. Does not touch any counter.
///
/// Tags are lowercased at write time, so clients lowercase the tag for a
/// case-insensitive effect; the filter itself does not normalize.
#[instrument(skip(state))]
pub async fn by_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Recipe>>> {
    let snapshot = state
        .recipes()
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await?;
    Ok(Json(search::filter_by_tag(&snapshot, &tag)))
}

/// Live feed of the full recipe set (SSE).
///
/// Delivers the current set on connect and again after every change to the
/// collection. Closing the connection disposes the subscription.
#[instrument(skip(state))]
pub async fn live(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    live_feed("recipes", state.recipes().subscribe())
}
