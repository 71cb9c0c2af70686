//! Recipe collection ordering.

use crate::models::Recipe;

/// Field a recipe listing can be ordered by.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    /// Creation time. Documents stored without one sort as epoch zero.
    #[default]
    CreatedAt,
    /// Title, case-sensitive lexicographic.
    Title,
    /// First tag, untagged recipes sorting as the empty string.
    Tag,
}

impl SortField {
    /// Parse from URL parameter value. Unknown values fall back to creation
    /// time, the default ordering.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s {
            "title" => Self::Title,
            "tag" => Self::Tag,
            _ => Self::CreatedAt,
        }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Title => "title",
            Self::Tag => "tag",
        }
    }
}

/// Listing direction.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Ascending.
    Asc,
    /// Descending (the listing default, newest first).
    #[default]
    Desc,
}

impl SortOrder {
    /// Parse from URL parameter value. Anything but `asc` is descending.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        if s == "asc" { Self::Asc } else { Self::Desc }
    }

    /// Convert to URL parameter value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }
}

/// Return `recipes` ordered by `field` in `order`, without mutating the
/// input. The sort is stable, so ties preserve input order.
#[must_use]
pub fn sort(recipes: &[Recipe], field: SortField, order: SortOrder) -> Vec<Recipe> {
    let mut sorted = recipes.to_vec();
    sorted.sort_by(|a, b| {
        let ascending = match field {
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
            SortField::Title => a.title.cmp(&b.title),
            SortField::Tag => a.first_tag().cmp(b.first_tag()),
        };
        match order {
            SortOrder::Asc => ascending,
            SortOrder::Desc => ascending.reverse(),
        }
    });
    sorted
}
