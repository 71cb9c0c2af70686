//! Integration tests for the favorites ledger, the toggle composition, and
//! the per-user live feed.

use std::collections::HashSet;

use axum::extract::{Path, State};

use cookeasy_core::RecipeId;
use cookeasy_integration_tests::TestContext;
use cookeasy_server::middleware::auth::RequireUser;
use cookeasy_server::models::NewRecipe;
use cookeasy_server::platform::{DocumentStore, collections};
use cookeasy_server::repo::Counter;
use cookeasy_server::routes::favorites;
use cookeasy_server::sort::{SortField, SortOrder};

fn new_recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        ingredients: "bread, butter".to_string(),
        steps: "toast, spread".to_string(),
        tags: String::new(),
    }
}

/// Run the toggle route handler directly for `user`.
async fn toggle(ctx: &TestContext, user_id: &str, recipe_id: &RecipeId) -> bool {
    let result = favorites::toggle(
        State(ctx.state.clone()),
        Path(recipe_id.as_str().to_string()),
        RequireUser(ctx.user(user_id)),
    )
    .await
    .expect("toggle should succeed");
    result.0.favorited
}

#[tokio::test]
async fn test_toggle_scenario_pairs_membership_and_counter() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipe = ctx
        .state
        .recipes()
        .add(&owner.id, new_recipe("Toast"))
        .await
        .expect("add");

    let prior = ctx.state.counters().read(Counter::Favorites).await.expect("read");
    assert!(ctx.state.favorites().list_ids(&owner.id).await.expect("ids").is_empty());

    // First toggle favorites the recipe and bumps the counter.
    assert!(toggle(&ctx, "u1", &recipe.id).await);
    let ids = ctx.state.favorites().list_ids(&owner.id).await.expect("ids");
    assert_eq!(ids, HashSet::from([recipe.id.clone()]));
    assert_eq!(
        ctx.state.counters().read(Counter::Favorites).await.expect("read"),
        prior + 1
    );

    // Second toggle removes it and restores the counter.
    assert!(!toggle(&ctx, "u1", &recipe.id).await);
    assert!(ctx.state.favorites().list_ids(&owner.id).await.expect("ids").is_empty());
    assert_eq!(
        ctx.state.counters().read(Counter::Favorites).await.expect("read"),
        prior
    );
}

#[tokio::test]
async fn test_first_favorite_lazily_creates_user_record() {
    let ctx = TestContext::new();
    let user = ctx.user("u7");
    let recipe_id = RecipeId::new("r1");

    assert!(
        ctx.store
            .get(collections::USERS, "u7")
            .await
            .expect("get")
            .is_none()
    );

    ctx.state
        .favorites()
        .add(&user.id, &user.email, &recipe_id)
        .await
        .expect("add favorite");

    let doc = ctx
        .store
        .get(collections::USERS, "u7")
        .await
        .expect("get")
        .expect("record created");
    assert_eq!(doc.fields["email"], "u7@example.com");
    assert_eq!(doc.fields["favorites"], serde_json::json!(["r1"]));
    assert!(doc.fields["createdAt"].is_string());
}

#[tokio::test]
async fn test_add_and_remove_are_idempotent() {
    let ctx = TestContext::new();
    let user = ctx.user("u1");
    let favorites = ctx.state.favorites();
    let recipe_id = RecipeId::new("r1");

    favorites.add(&user.id, &user.email, &recipe_id).await.expect("add");
    favorites.add(&user.id, &user.email, &recipe_id).await.expect("re-add");
    assert_eq!(favorites.list_ids(&user.id).await.expect("ids").len(), 1);

    favorites.remove(&user.id, &recipe_id).await.expect("remove");
    favorites.remove(&user.id, &recipe_id).await.expect("re-remove");
    assert!(favorites.list_ids(&user.id).await.expect("ids").is_empty());

    // Removing for a user with no record at all is also a no-op.
    let stranger = ctx.user("u9");
    favorites.remove(&stranger.id, &recipe_id).await.expect("no-op remove");
}

#[tokio::test]
async fn test_list_ids_empty_without_record() {
    let ctx = TestContext::new();
    let user = ctx.user("u1");
    assert!(ctx.state.favorites().list_ids(&user.id).await.expect("ids").is_empty());
}

#[tokio::test]
async fn test_favorite_listing_follows_snapshot_order() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();
    let favorites = ctx.state.favorites();

    let mut added = Vec::new();
    for title in ["First", "Second", "Third"] {
        added.push(recipes.add(&owner.id, new_recipe(title)).await.expect("add"));
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    // Favorite in reverse creation order.
    let third = added.get(2).expect("third");
    let first = added.first().expect("first");
    favorites.add(&owner.id, &owner.email, &third.id).await.expect("fav");
    favorites.add(&owner.id, &owner.email, &first.id).await.expect("fav");

    // Listing order comes from the snapshot (newest first), not from the
    // order the favorites were added.
    let snapshot = recipes
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await
        .expect("list");
    let titles: Vec<String> = favorites
        .list_recipes(&owner.id, &snapshot)
        .await
        .expect("favorites")
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(titles, vec!["Third", "First"]);
}

#[tokio::test]
async fn test_favorited_id_of_deleted_recipe_drops_from_listing() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();
    let favorites = ctx.state.favorites();

    let recipe = recipes.add(&owner.id, new_recipe("Ephemeral")).await.expect("add");
    favorites.add(&owner.id, &owner.email, &recipe.id).await.expect("fav");
    recipes.delete(&recipe.id, &owner.id).await.expect("delete");

    // The stale id stays in the set but resolves to nothing.
    assert_eq!(favorites.list_ids(&owner.id).await.expect("ids").len(), 1);
    let snapshot = recipes
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await
        .expect("list");
    assert!(
        favorites
            .list_recipes(&owner.id, &snapshot)
            .await
            .expect("favorites")
            .is_empty()
    );
}

#[tokio::test]
async fn test_anonymous_feed_delivers_one_empty_set() {
    let ctx = TestContext::new();

    let mut feed = ctx.state.favorites().subscribe(None);
    assert_eq!(feed.recv().await, Some(HashSet::new()));
    assert_eq!(feed.recv().await, None);
}

#[tokio::test]
async fn test_user_feed_delivers_initial_set_and_changes() {
    let ctx = TestContext::new();
    let user = ctx.user("u1");
    let favorites = ctx.state.favorites();
    let recipe_id = RecipeId::new("r1");

    let mut feed = favorites.subscribe(Some(&user.id));
    assert_eq!(feed.recv().await, Some(HashSet::new()));

    favorites.add(&user.id, &user.email, &recipe_id).await.expect("fav");
    assert_eq!(
        feed.recv().await,
        Some(HashSet::from([recipe_id.clone()]))
    );

    favorites.remove(&user.id, &recipe_id).await.expect("unfav");
    assert_eq!(feed.recv().await, Some(HashSet::new()));

    feed.unsubscribe();
}

#[tokio::test]
async fn test_user_feed_suppresses_unrelated_user_changes() {
    let ctx = TestContext::new();
    let watcher = ctx.user("u1");
    let other = ctx.user("u2");
    let favorites = ctx.state.favorites();

    let mut feed = favorites.subscribe(Some(&watcher.id));
    assert_eq!(feed.recv().await, Some(HashSet::new()));

    // Another user's favorite changes the collection but not the
    // watcher's set; then the watcher's own change must come through.
    favorites
        .add(&other.id, &other.email, &RecipeId::new("r9"))
        .await
        .expect("other fav");
    favorites
        .add(&watcher.id, &watcher.email, &RecipeId::new("r1"))
        .await
        .expect("watcher fav");

    assert_eq!(
        feed.recv().await,
        Some(HashSet::from([RecipeId::new("r1")]))
    );
}
