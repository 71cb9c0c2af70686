//! User record domain type.
//!
//! A user record exists only once its owner favorites something; until then
//! the identity service is the only place the account is known.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use cookeasy_core::{Email, RecipeId, UserId};

use crate::platform::Document;

/// A user's record in the `users` collection.
#[derive(Debug, Clone)]
pub struct UserRecord {
    /// Identity reference; doubles as the document id.
    pub id: UserId,
    /// Account email captured when the record was created.
    pub email: Option<String>,
    /// Favorited recipe ids, in stored array order. Storage order carries
    /// no meaning; listings resolve against the recipe snapshot instead.
    pub favorites: Vec<RecipeId>,
    /// When the record was lazily created.
    pub created_at: Option<DateTime<Utc>>,
}

/// Stored field layout of a user document.
#[derive(Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
struct UserFields {
    email: Option<String>,
    favorites: Vec<RecipeId>,
    created_at: Option<DateTime<Utc>>,
}

impl UserRecord {
    /// Convert a raw platform document into a `UserRecord`.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the document fields are not a user shape.
    pub fn from_document(doc: &Document) -> Result<Self, serde_json::Error> {
        let fields: UserFields = serde_json::from_value(doc.fields.clone())?;
        Ok(Self {
            id: UserId::new(doc.id.clone()),
            email: fields.email,
            favorites: fields.favorites,
            created_at: fields.created_at,
        })
    }

    /// Field object for a record created by a first favorite action.
    #[must_use]
    pub fn initial_fields(email: &Email, first_favorite: &RecipeId, now: DateTime<Utc>) -> Value {
        serde_json::json!({
            "email": email.as_str(),
            "favorites": [first_favorite],
            "createdAt": now,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_from_document_defaults() {
        let doc = Document {
            id: "u1".to_string(),
            fields: json!({}),
        };

        let record = UserRecord::from_document(&doc).unwrap();
        assert_eq!(record.id, UserId::new("u1"));
        assert!(record.email.is_none());
        assert!(record.favorites.is_empty());
    }

    #[test]
    fn test_initial_fields_seed_the_favorites_set() {
        let email = Email::parse("cook@example.com").unwrap();
        let fields = UserRecord::initial_fields(&email, &RecipeId::new("r1"), Utc::now());

        assert_eq!(fields["email"], "cook@example.com");
        assert_eq!(fields["favorites"], json!(["r1"]));
        assert!(fields["createdAt"].is_string());
    }
}
