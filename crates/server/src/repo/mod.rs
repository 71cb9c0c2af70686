//! Repositories over the document platform.
//!
//! Each repository is a thin typed layer over the [`DocumentStore`] seam:
//! it owns normalization, authorization, and counter pairing, but no
//! storage. All of them are cheap to clone and share the same store handle.
//!
//! [`DocumentStore`]: crate::platform::DocumentStore

pub mod favorites;
pub mod recipes;
pub mod stats;

pub use favorites::FavoritesLedger;
pub use recipes::RecipeRepository;
pub use stats::{Counter, CounterSnapshot, CounterStore};
