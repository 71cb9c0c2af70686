//! Ingredient-overlap search and tag filtering.
//!
//! Matching runs over the in-memory recipe snapshot, never in the platform:
//! the inclusion rule is substring containment with a fixed 90% token
//! coverage threshold, which no hosted query surface expresses.

use crate::models::Recipe;

/// Minimum fraction of query tokens a recipe must cover to be included.
///
/// Deliberately below 1.0: a long query tolerates one missed ingredient.
const MATCH_THRESHOLD: f64 = 0.9;

/// Parse a free-text ingredient query into tokens: split on commas, trim,
/// drop empties.
#[must_use]
pub fn parse_query(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Filter `recipes` to those covering at least 90% of the query tokens.
///
/// A token is covered when any recipe ingredient contains it as a
/// case-insensitive substring. An empty token list returns the input
/// unchanged; a recipe without ingredients never matches a non-empty query.
/// Output preserves input order - there is no ranking by match strength.
#[must_use]
pub fn search_by_ingredients(recipes: &[Recipe], query: &[String]) -> Vec<Recipe> {
    if query.is_empty() {
        return recipes.to_vec();
    }

    recipes
        .iter()
        .filter(|recipe| {
            if recipe.ingredients.is_empty() {
                return false;
            }

            let matches = query
                .iter()
                .filter(|token| {
                    let token = token.to_lowercase();
                    recipe
                        .ingredients
                        .iter()
                        .any(|ingredient| ingredient.to_lowercase().contains(&token))
                })
                .count();

            #[allow(clippy::cast_precision_loss)] // Query lengths are tiny
            let coverage = matches as f64 / query.len() as f64;
            coverage >= MATCH_THRESHOLD
        })
        .cloned()
        .collect()
}

/// Filter `recipes` to those whose tag set contains `tag` exactly.
///
/// Tags are lowercased at write time; this filter does not normalize, so
/// callers wanting case-insensitive behavior lowercase the query themselves.
/// An empty tag returns the input unchanged.
#[must_use]
pub fn filter_by_tag(recipes: &[Recipe], tag: &str) -> Vec<Recipe> {
    if tag.is_empty() {
        return recipes.to_vec();
    }

    recipes
        .iter()
        .filter(|recipe| recipe.tags.iter().any(|t| t == tag))
        .cloned()
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::DateTime;
    use cookeasy_core::{RecipeId, UserId};

    use super::*;

    fn recipe(id: &str, ingredients: &[&str], tags: &[&str]) -> Recipe {
        Recipe {
            id: RecipeId::new(id),
            title: id.to_uppercase(),
            ingredients: ingredients.iter().map(ToString::to_string).collect(),
            steps: vec!["cook".to_string()],
            tags: tags.iter().map(ToString::to_string).collect(),
            owner_id: UserId::new("u1"),
            created_at: DateTime::UNIX_EPOCH,
            updated_at: DateTime::UNIX_EPOCH,
        }
    }

    fn ids(recipes: &[Recipe]) -> Vec<&str> {
        recipes.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_parse_query_splits_trims_and_drops_empties() {
        assert_eq!(
            parse_query(" flour , milk ,, eggs "),
            vec!["flour", "milk", "eggs"]
        );
        assert!(parse_query("").is_empty());
        assert!(parse_query(" , ").is_empty());
    }

    #[test]
    fn test_empty_query_returns_input_unchanged() {
        let recipes = vec![recipe("a", &[], &[]), recipe("b", &["milk"], &[])];
        let results = search_by_ingredients(&recipes, &[]);
        assert_eq!(ids(&results), vec!["a", "b"]);
    }

    #[test]
    fn test_ingredientless_recipe_never_matches() {
        let recipes = vec![recipe("a", &[], &[])];
        let query = vec!["anything".to_string()];
        assert!(search_by_ingredients(&recipes, &query).is_empty());
    }

    #[test]
    fn test_substring_containment_is_case_insensitive() {
        let recipes = vec![recipe("a", &["2 cups Whole Milk"], &[])];
        let query = vec!["milk".to_string()];
        assert_eq!(ids(&search_by_ingredients(&recipes, &query)), vec!["a"]);

        let query = vec!["MILK".to_string()];
        assert_eq!(ids(&search_by_ingredients(&recipes, &query)), vec!["a"]);
    }

    #[test]
    fn test_pancakes_coverage_scenario() {
        // 3 of 4 tokens covered = 0.75 < 0.9: excluded.
        let recipes = vec![recipe("pancakes", &["flour", "milk", "eggs"], &["breakfast"])];
        let query = parse_query("flour, milk, eggs, sugar");
        assert!(search_by_ingredients(&recipes, &query).is_empty());

        // 3 of 3 tokens covered = 1.0 >= 0.9: included.
        let query = parse_query("flour, milk, eggs");
        assert_eq!(ids(&search_by_ingredients(&recipes, &query)), vec!["pancakes"]);
    }

    #[test]
    fn test_threshold_boundary_at_ten_tokens() {
        let ingredients: Vec<String> = (0..9).map(|i| format!("item{i}")).collect();
        let ingredient_refs: Vec<&str> = ingredients.iter().map(String::as_str).collect();
        let recipes = vec![recipe("r", &ingredient_refs, &[])];

        // 9 of 10 covered: 0.9 >= 0.9, included.
        let mut query: Vec<String> = (0..9).map(|i| format!("item{i}")).collect();
        query.push("missing".to_string());
        assert_eq!(ids(&search_by_ingredients(&recipes, &query)), vec!["r"]);

        // 8 of 10 covered: 0.8 < 0.9, excluded.
        let mut query: Vec<String> = (0..8).map(|i| format!("item{i}")).collect();
        query.push("missing-one".to_string());
        query.push("missing-two".to_string());
        assert!(search_by_ingredients(&recipes, &query).is_empty());
    }

    #[test]
    fn test_results_preserve_input_order() {
        let recipes = vec![
            recipe("c", &["milk", "flour"], &[]),
            recipe("a", &["milk syrup", "flour"], &[]),
            recipe("b", &["oat milk", "rye flour"], &[]),
        ];
        let query = parse_query("milk, flour");
        assert_eq!(ids(&search_by_ingredients(&recipes, &query)), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_filter_by_tag_exact_membership() {
        let recipes = vec![
            recipe("a", &[], &["vegan", "quick"]),
            recipe("b", &[], &["dessert"]),
            recipe("c", &[], &[]),
        ];

        assert_eq!(ids(&filter_by_tag(&recipes, "vegan")), vec!["a"]);
        // Tags were lowercased at write time; the filter does not normalize.
        assert!(filter_by_tag(&recipes, "Vegan").is_empty());
        assert_eq!(ids(&filter_by_tag(&recipes, "")), vec!["a", "b", "c"]);
    }
}
