//! Integration tests for CookEasy.
//!
//! Unlike a deployment, tests run the service over the in-memory platform
//! backend ([`MemoryStore`]), so every test is hermetic: no network, no
//! credentials, nothing to start first.
//!
//! ```bash
//! cargo test -p cookeasy-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `recipe_flow` - Repository CRUD, ownership gating, counter pairing
//! - `favorites_flow` - Ledger semantics, toggle composition, live feeds
//! - `http_api` - The JSON surface exercised through the router

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use cookeasy_core::{Email, UserId};
use cookeasy_server::config::{IdentityConfig, PlatformConfig, ServerConfig};
use cookeasy_server::middleware::auth::CurrentUser;
use cookeasy_server::platform::{IdentityClient, MemoryStore};
use cookeasy_server::state::AppState;

/// A test harness: application state over a fresh in-memory store.
pub struct TestContext {
    /// Full application state (repositories, counters, token cache).
    pub state: AppState,
    /// The backing store, for direct inspection.
    pub store: MemoryStore,
}

impl TestContext {
    /// Create a context over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let config = test_config();
        let identity = IdentityClient::new(&config.identity);
        let state = AppState::new(config, Arc::new(store.clone()), identity);
        Self { state, store }
    }

    /// An authenticated account for request-level calls.
    ///
    /// Tests mint identities directly instead of round-tripping through the
    /// identity service; the service is not part of what these tests cover.
    #[must_use]
    pub fn user(&self, id: &str) -> CurrentUser {
        CurrentUser {
            id: UserId::new(id),
            email: Email::parse(&format!("{id}@example.com")).expect("valid test email"),
        }
    }
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration pointing at addresses no test ever dials.
#[must_use]
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: std::net::IpAddr::from([127, 0, 0, 1]),
        port: 0,
        platform: PlatformConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: SecretString::from("unused-in-tests"),
            watch_poll_interval: Duration::from_millis(50),
        },
        identity: IdentityConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            api_key: SecretString::from("unused-in-tests"),
        },
        sentry_dsn: None,
    }
}
