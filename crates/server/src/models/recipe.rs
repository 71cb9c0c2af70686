//! Recipe domain type, raw input types, and field normalization.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cookeasy_core::{RecipeId, UserId};

use crate::platform::Document;

/// A recipe (domain type).
///
/// `owner_id` is stamped from the acting identity at creation and never
/// changes afterwards; update patches cannot touch it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    /// Platform-assigned opaque identifier.
    pub id: RecipeId,
    /// Display title, trimmed, never empty.
    pub title: String,
    /// Ordered ingredient list. May be empty for legacy documents.
    pub ingredients: Vec<String>,
    /// Ordered preparation steps.
    pub steps: Vec<String>,
    /// Tags, lowercased at write time.
    pub tags: Vec<String>,
    /// The identity that created this recipe.
    pub owner_id: UserId,
    /// Creation time. Epoch zero for documents stored without one.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

/// Stored field layout of a recipe document.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct RecipeFields {
    title: String,
    ingredients: Vec<String>,
    steps: Vec<String>,
    tags: Vec<String>,
    owner_id: Option<UserId>,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
}

impl Recipe {
    /// Convert a raw platform document into a `Recipe`.
    ///
    /// Missing timestamps map to epoch zero (such recipes sort earliest in
    /// ascending creation order). A missing owner maps to an empty owner
    /// reference, which no caller identity can match.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the document fields are not a recipe shape.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: RecipeFields = serde_json::from_value(doc.fields.clone())?;
        let epoch = DateTime::UNIX_EPOCH;

        Ok(Self {
            id: RecipeId::new(doc.id.clone()),
            title: fields.title,
            ingredients: fields.ingredients,
            steps: fields.steps,
            tags: fields.tags,
            owner_id: fields.owner_id.unwrap_or_else(|| UserId::new("")),
            created_at: fields.created_at.unwrap_or(epoch),
            updated_at: fields.updated_at.unwrap_or(epoch),
        })
    }

    /// The stored field object for this recipe (everything except the id,
    /// which the platform keeps in the document path).
    #[must_use]
    pub fn to_fields(&self) -> Value {
        serde_json::json!({
            "title": self.title,
            "ingredients": self.ingredients,
            "steps": self.steps,
            "tags": self.tags,
            "ownerId": self.owner_id,
            "createdAt": self.created_at,
            "updatedAt": self.updated_at,
        })
    }

    /// The recipe's first tag, used as its tag sort key. Empty when untagged.
    #[must_use]
    pub fn first_tag(&self) -> &str {
        self.tags.first().map_or("", String::as_str)
    }
}

/// Raw add-recipe input as submitted: title plus comma-separated lists.
#[derive(Debug, Clone, Deserialize)]
pub struct NewRecipe {
    /// Recipe title.
    pub title: String,
    /// Comma-separated ingredient list.
    pub ingredients: String,
    /// Comma-separated preparation steps.
    pub steps: String,
    /// Comma-separated tags. Optional.
    #[serde(default)]
    pub tags: String,
}

/// Raw update-recipe input; only provided fields are merged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipePatch {
    /// New title.
    pub title: Option<String>,
    /// New comma-separated ingredient list.
    pub ingredients: Option<String>,
    /// New comma-separated preparation steps.
    pub steps: Option<String>,
    /// New comma-separated tags.
    pub tags: Option<String>,
}

/// Split a raw comma-separated list into trimmed, non-empty items.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

/// Split a raw comma-separated tag list: trimmed, lowercased, non-empty.
#[must_use]
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|tag| tag.trim().to_lowercase())
        .filter(|tag| !tag.is_empty())
        .collect()
}
