//! `OAuth2` provider system with registry and factory pattern
//!
//! 1. **Provider Registry**: map of provider id -> factory function
//! 2. **Factory Pattern**: factories build an adapter from credentials and a transport
//! 3. **Decoupled**: the registry never needs to know provider-specific wire formats
//!
//! The registry is an ordinary value owned by the caller (usually through
//! [`crate::service::LoginService`]), so tests and embedders can build their own.

pub mod http;
pub mod providers;
pub mod state;

pub use http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
pub use state::{StatePolicy, StateStore};

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Credentials;
use crate::models::{ProviderId, Userinfo};
use crate::Result;

// ============================================================================
// Provider Trait
// ============================================================================

/// `OAuth2` provider trait
///
/// Every adapter offers the same two steps:
/// 1. `redirect_url` - build the authorization URL
/// 2. `get_userinfo` - exchange the code for a token, then fetch and normalize the profile
#[async_trait]
pub trait Provider: Send + Sync {
    /// Provider identifier
    fn provider_id(&self) -> ProviderId;

    /// How the provider uses the `state` parameter
    fn state_policy(&self) -> StatePolicy {
        StatePolicy::None
    }

    /// Build the authorization URL
    ///
    /// `state` is only supplied for [`StatePolicy::Random`] providers.
    /// No network I/O.
    fn redirect_url(&self, state: Option<&str>) -> Result<String>;

    /// Exchange authorization code for normalized user info
    ///
    /// Failures before an access token is obtained are wrapped in
    /// [`crate::Error::TokenExchange`]. The token itself is discarded.
    async fn get_userinfo(&self, code: &str) -> Result<Userinfo>;
}

// ============================================================================
// Provider Registry
// ============================================================================

/// Factory function type for creating providers
pub type ProviderFactory = fn(Credentials, Arc<dyn HttpTransport>) -> Box<dyn Provider>;

/// Provider registry
///
/// Maps provider ids to factory functions. Adding a provider means
/// registering one more factory.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    factories: HashMap<ProviderId, ProviderFactory>,
}

impl ProviderRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every adapter shipped by this crate
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        providers::register_builtin(&mut registry);
        registry
    }

    /// Register (or replace) the factory for a provider
    pub fn register(&mut self, provider: ProviderId, factory: ProviderFactory) {
        self.factories.insert(provider, factory);
    }

    #[must_use]
    pub fn factory(&self, provider: ProviderId) -> Option<ProviderFactory> {
        self.factories.get(&provider).copied()
    }

    #[must_use]
    pub fn contains(&self, provider: ProviderId) -> bool {
        self.factories.contains_key(&provider)
    }

    /// Registered providers ordered by code
    #[must_use]
    pub fn providers(&self) -> Vec<ProviderId> {
        let mut providers: Vec<_> = self.factories.keys().copied().collect();
        providers.sort();
        providers
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.providers())
            .finish()
    }
}
