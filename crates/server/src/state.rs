//! Application state shared across handlers.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::middleware::auth::CurrentUser;
use crate::platform::{DocumentStore, IdentityClient};
use crate::repo::{CounterStore, FavoritesLedger, RecipeRepository};

/// How long a verified bearer token is remembered before the identity
/// service is asked again.
const TOKEN_CACHE_TTL: Duration = Duration::from_secs(300);
const TOKEN_CACHE_CAPACITY: u64 = 10_000;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// platform clients and repositories. The document store is injected as a
/// trait object so tests run over the in-memory backend.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ServerConfig,
    store: Arc<dyn DocumentStore>,
    identity: IdentityClient,
    recipes: RecipeRepository,
    favorites: FavoritesLedger,
    counters: CounterStore,
    token_cache: Cache<String, CurrentUser>,
}

impl AppState {
    /// Create a new application state over the given platform clients.
    #[must_use]
    pub fn new(
        config: ServerConfig,
        store: Arc<dyn DocumentStore>,
        identity: IdentityClient,
    ) -> Self {
        let counters = CounterStore::new(Arc::clone(&store));
        let recipes = RecipeRepository::new(Arc::clone(&store), counters.clone());
        let favorites = FavoritesLedger::new(Arc::clone(&store));

        let token_cache = Cache::builder()
            .max_capacity(TOKEN_CACHE_CAPACITY)
            .time_to_live(TOKEN_CACHE_TTL)
            .build();

        Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                identity,
                recipes,
                favorites,
                counters,
                token_cache,
            }),
        }
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get the document platform handle.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.inner.store
    }

    /// Get a reference to the identity service client.
    #[must_use]
    pub fn identity(&self) -> &IdentityClient {
        &self.inner.identity
    }

    /// Get a reference to the recipe repository.
    #[must_use]
    pub fn recipes(&self) -> &RecipeRepository {
        &self.inner.recipes
    }

    /// Get a reference to the favorites ledger.
    #[must_use]
    pub fn favorites(&self) -> &FavoritesLedger {
        &self.inner.favorites
    }

    /// Get a reference to the counter store.
    #[must_use]
    pub fn counters(&self) -> &CounterStore {
        &self.inner.counters
    }

    /// Resolve a bearer token to the account it belongs to, consulting the
    /// verification cache before the identity service.
    ///
    /// # Errors
    ///
    /// Returns an identity error if the token is invalid or the service is
    /// unreachable.
    pub async fn verify_token(&self, token: &str) -> Result<CurrentUser> {
        if let Some(user) = self.inner.token_cache.get(token).await {
            return Ok(user);
        }

        let (id, email) = self.inner.identity.lookup(token).await?;
        let user = CurrentUser { id, email };
        self.inner
            .token_cache
            .insert(token.to_owned(), user.clone())
            .await;
        Ok(user)
    }

    /// Drop a token's cached verification (logout).
    pub async fn forget_token(&self, token: &str) {
        self.inner.token_cache.invalidate(token).await;
    }
}
