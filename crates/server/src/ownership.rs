//! The ownership gate: may this identity mutate this record?
//!
//! Both `update` and `delete` run the same check, so it lives in one place
//! and returns a tagged result instead of throwing from inside each caller.

use cookeasy_core::UserId;

use crate::error::AppError;
use crate::models::Recipe;

/// Outcome of an ownership check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OwnerGate {
    /// The caller owns the record; the mutation may proceed.
    Authorized,
    /// The record exists but belongs to someone else.
    Forbidden,
    /// There is no record to mutate.
    NotFound,
}

impl OwnerGate {
    /// Check a fetched record against the acting identity.
    #[must_use]
    pub fn check(record: Option<&Recipe>, caller: &UserId) -> Self {
        match record {
            None => Self::NotFound,
            Some(recipe) if recipe.owner_id == *caller => Self::Authorized,
            Some(_) => Self::Forbidden,
        }
    }

    /// Convert the gate outcome into a result, using `id` for messages.
    ///
    /// # Errors
    ///
    /// `Forbidden` and `NotFound` become the matching [`AppError`].
    pub fn into_result(self, id: &str) -> Result<(), AppError> {
        match self {
            Self::Authorized => Ok(()),
            Self::Forbidden => Err(AppError::Forbidden(format!(
                "recipe {id} belongs to another user"
            ))),
            Self::NotFound => Err(AppError::NotFound(format!("recipe {id}"))),
        }
    }
}
