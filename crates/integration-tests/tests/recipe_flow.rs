//! Integration tests for recipe CRUD, ownership gating, and counter pairing.

use std::time::Duration;

use cookeasy_core::RecipeId;
use cookeasy_integration_tests::TestContext;
use cookeasy_server::error::AppError;
use cookeasy_server::models::{NewRecipe, RecipePatch};
use cookeasy_server::repo::Counter;
use cookeasy_server::sort::{SortField, SortOrder};

fn new_recipe(title: &str) -> NewRecipe {
    NewRecipe {
        title: title.to_string(),
        ingredients: "2 cups flour, 1 cup milk, 3 eggs".to_string(),
        steps: "Mix dry, Add wet, Bake".to_string(),
        tags: "Breakfast, Quick".to_string(),
    }
}

#[tokio::test]
async fn test_add_normalizes_and_counts() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");

    let recipe = ctx
        .state
        .recipes()
        .add(&owner.id, new_recipe("  Pancakes  "))
        .await
        .expect("add should succeed");

    assert_eq!(recipe.title, "Pancakes");
    assert_eq!(recipe.ingredients, vec!["2 cups flour", "1 cup milk", "3 eggs"]);
    assert_eq!(recipe.steps, vec!["Mix dry", "Add wet", "Bake"]);
    // Tags were lowercased at write time.
    assert_eq!(recipe.tags, vec!["breakfast", "quick"]);
    assert_eq!(recipe.owner_id, owner.id);
    assert!(!recipe.id.as_str().is_empty());

    let count = ctx.state.counters().read(Counter::Recipes).await.expect("read");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_add_rejects_empty_required_fields() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();

    let mut input = new_recipe("Pancakes");
    input.title = "   ".to_string();
    assert!(matches!(
        recipes.add(&owner.id, input).await,
        Err(AppError::Validation(_))
    ));

    let mut input = new_recipe("Pancakes");
    input.ingredients = " , , ".to_string();
    assert!(matches!(
        recipes.add(&owner.id, input).await,
        Err(AppError::Validation(_))
    ));

    let mut input = new_recipe("Pancakes");
    input.steps = String::new();
    assert!(matches!(
        recipes.add(&owner.id, input).await,
        Err(AppError::Validation(_))
    ));

    // Nothing was persisted and the counter never moved.
    let count = ctx.state.counters().read(Counter::Recipes).await.expect("read");
    assert_eq!(count, 0);
    let listing = recipes
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await
        .expect("list");
    assert!(listing.is_empty());
}

#[tokio::test]
async fn test_update_roundtrip_advances_updated_at() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();

    let recipe = recipes
        .add(&owner.id, new_recipe("Pancakes"))
        .await
        .expect("add");
    tokio::time::sleep(Duration::from_millis(5)).await;

    let patch = RecipePatch {
        title: Some("Blueberry Pancakes".to_string()),
        ..RecipePatch::default()
    };
    let updated = recipes
        .update(&recipe.id, &owner.id, patch)
        .await
        .expect("update should succeed");

    assert_eq!(updated.title, "Blueberry Pancakes");
    assert!(updated.updated_at > recipe.updated_at);

    // The listing reflects the change and every other field is untouched.
    let listing = recipes
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await
        .expect("list");
    let stored = listing.iter().find(|r| r.id == recipe.id).expect("present");
    assert_eq!(stored.title, "Blueberry Pancakes");
    assert_eq!(stored.ingredients, recipe.ingredients);
    assert_eq!(stored.steps, recipe.steps);
    assert_eq!(stored.tags, recipe.tags);
    assert_eq!(stored.owner_id, owner.id);
    assert_eq!(stored.created_at, recipe.created_at);
}

#[tokio::test]
async fn test_update_does_not_touch_counters() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();

    let recipe = recipes.add(&owner.id, new_recipe("Toast")).await.expect("add");
    let before = ctx.state.counters().read(Counter::Recipes).await.expect("read");

    recipes
        .update(
            &recipe.id,
            &owner.id,
            RecipePatch {
                tags: Some("snack".to_string()),
                ..RecipePatch::default()
            },
        )
        .await
        .expect("update");

    let after = ctx.state.counters().read(Counter::Recipes).await.expect("read");
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_non_owner_mutations_are_forbidden_and_harmless() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let intruder = ctx.user("u2");
    let recipes = ctx.state.recipes();

    let recipe = recipes
        .add(&owner.id, new_recipe("Secret Sauce"))
        .await
        .expect("add");

    let patch = RecipePatch {
        title: Some("Stolen Sauce".to_string()),
        ..RecipePatch::default()
    };
    assert!(matches!(
        recipes.update(&recipe.id, &intruder.id, patch).await,
        Err(AppError::Forbidden(_))
    ));
    assert!(matches!(
        recipes.delete(&recipe.id, &intruder.id).await,
        Err(AppError::Forbidden(_))
    ));

    // The record is unmodified and still counted.
    let stored = recipes.fetch(&recipe.id).await.expect("fetch").expect("present");
    assert_eq!(stored.title, "Secret Sauce");
    assert_eq!(stored.updated_at, recipe.updated_at);
    let count = ctx.state.counters().read(Counter::Recipes).await.expect("read");
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_mutating_missing_recipe_is_not_found() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();
    let ghost = RecipeId::new("no-such-recipe");

    assert!(matches!(
        recipes.update(&ghost, &owner.id, RecipePatch::default()).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        recipes.delete(&ghost, &owner.id).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_delete_removes_and_decrements() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();

    let keeper = recipes.add(&owner.id, new_recipe("Keeper")).await.expect("add");
    let goner = recipes.add(&owner.id, new_recipe("Goner")).await.expect("add");
    assert_eq!(ctx.state.counters().read(Counter::Recipes).await.expect("read"), 2);

    recipes.delete(&goner.id, &owner.id).await.expect("delete");

    assert_eq!(ctx.state.counters().read(Counter::Recipes).await.expect("read"), 1);
    let listing = recipes
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await
        .expect("list");
    assert_eq!(listing.len(), 1);
    assert_eq!(listing.first().expect("one").id, keeper.id);
}

#[tokio::test]
async fn test_list_all_orders_by_requested_field() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();

    for title in ["Waffles", "Arepas", "Muffins"] {
        recipes.add(&owner.id, new_recipe(title)).await.expect("add");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let by_title: Vec<String> = recipes
        .list_all(SortField::Title, SortOrder::Asc)
        .await
        .expect("list")
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(by_title, vec!["Arepas", "Muffins", "Waffles"]);

    let newest_first: Vec<String> = recipes
        .list_all(SortField::CreatedAt, SortOrder::Desc)
        .await
        .expect("list")
        .into_iter()
        .map(|r| r.title)
        .collect();
    assert_eq!(newest_first, vec!["Muffins", "Arepas", "Waffles"]);
}

#[tokio::test]
async fn test_live_feed_delivers_initial_and_change_snapshots() {
    let ctx = TestContext::new();
    let owner = ctx.user("u1");
    let recipes = ctx.state.recipes();

    let mut feed = recipes.subscribe();
    let initial = feed.recv().await.expect("initial snapshot");
    assert!(initial.is_empty());

    recipes.add(&owner.id, new_recipe("Pancakes")).await.expect("add");
    let after_add = feed.recv().await.expect("snapshot after add");
    assert_eq!(after_add.len(), 1);
    assert_eq!(after_add.first().expect("one").title, "Pancakes");

    feed.unsubscribe();
}
