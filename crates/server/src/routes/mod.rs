//! HTTP route handlers for the recipe service.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                  - Liveness check (in main)
//! GET  /health/ready            - Platform reachability (in main)
//!
//! # Auth
//! POST /auth/register           - Create account, returns session
//! POST /auth/login              - Exchange credentials for session
//! POST /auth/logout             - Drop cached token verification
//!
//! # Recipes
//! GET    /recipes               - Full listing (?sort=&order=)
//! POST   /recipes               - Add recipe (auth)
//! PATCH  /recipes/{id}          - Update recipe (auth, owner only)
//! DELETE /recipes/{id}          - Delete recipe (auth, owner only)
//! GET    /recipes/search?q=     - Ingredient search (counts a search)
//! GET    /recipes/tag/{tag}     - Tag filter (no counter)
//! GET    /recipes/live          - SSE live feed of the full recipe set
//!
//! # Favorites
//! GET  /favorites               - Favorite recipes (auth)
//! GET  /favorites/ids           - Favorite id set (auth)
//! POST /favorites/{id}/toggle   - Toggle + counter pair (auth)
//! GET  /favorites/live          - SSE live feed of the favorite id set
//!
//! # Stats
//! GET  /stats                   - All three usage counters
//! ```

pub mod auth;
pub mod favorites;
pub mod recipes;
pub mod stats;

use std::convert::Infallible;

use axum::{
    Router,
    response::sse::{Event, KeepAlive, Sse},
    routing::{get, patch, post},
};
use futures::Stream;

use crate::state::AppState;
use crate::subscription::Subscription;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the recipe routes router.
pub fn recipe_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(recipes::list).post(recipes::create))
        .route("/search", get(recipes::search))
        .route("/tag/{tag}", get(recipes::by_tag))
        .route("/live", get(recipes::live))
        .route("/{id}", patch(recipes::update).delete(recipes::remove))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::list))
        .route("/ids", get(favorites::ids))
        .route("/{id}/toggle", post(favorites::toggle))
        .route("/live", get(favorites::live))
}

/// Create all routes for the recipe service.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .nest("/recipes", recipe_routes())
        .nest("/favorites", favorite_routes())
        .route("/stats", get(stats::show))
}

/// Turn a live subscription into a server-sent-event stream.
///
/// One named event per delivered snapshot; closing the connection drops the
/// stream, which drops the subscription handle and disposes the feed.
pub(crate) fn live_feed<T>(
    name: &'static str,
    subscription: Subscription<T>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    T: serde::Serialize + Send + 'static,
{
    let stream = futures::stream::unfold(subscription, move |mut subscription| async move {
        let snapshot = subscription.recv().await?;
        let event = Event::default()
            .event(name)
            .json_data(&snapshot)
            .unwrap_or_else(|err| {
                tracing::warn!(feed = name, error = %err, "live feed serialization failed");
                Event::default().event(name)
            });
        Some((Ok(event), subscription))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
