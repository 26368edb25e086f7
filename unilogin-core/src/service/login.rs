//! Login service: owns configuration, registry, transport and state store
//!
//! Providers are built on demand by [`LoginService::new_server`]. Tokens are
//! only used transiently inside an adapter and never stored.

use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{Config, OAuth2Config};
use crate::models::ProviderId;
use crate::oauth2::{HttpTransport, ProviderRegistry, ReqwestTransport, StateStore};
use crate::service::Server;
use crate::{Error, Result};

/// `OAuth2` login service
#[derive(Clone)]
pub struct LoginService {
    config: Option<Arc<OAuth2Config>>,
    registry: Arc<ProviderRegistry>,
    transport: Arc<dyn HttpTransport>,
    states: StateStore,
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService")
            .field("initialized", &self.is_initialized())
            .field("registry", &self.registry)
            .field("state_ttl", &self.states.ttl())
            .finish_non_exhaustive()
    }
}

impl LoginService {
    /// Create an uninitialized service with the builtin providers
    #[must_use]
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config: None,
            registry: Arc::new(ProviderRegistry::builtin()),
            transport,
            states: StateStore::default(),
        }
    }

    /// Build a ready-to-use service from application configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let transport = ReqwestTransport::from_config(&config.http)?;
        let mut service = Self::new(Arc::new(transport)).with_state_ttl(config.state.ttl());
        service.init(config.oauth2.clone());
        Ok(service)
    }

    #[must_use]
    pub fn with_registry(mut self, registry: ProviderRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Replace the state store with a fresh one using `ttl`
    #[must_use]
    pub fn with_state_ttl(mut self, ttl: Duration) -> Self {
        self.states = StateStore::new(ttl);
        self
    }

    /// Install the provider credentials
    pub fn init(&mut self, config: OAuth2Config) {
        info!(
            configured = ?config.configured_providers(),
            "OAuth2 configuration initialized"
        );
        self.config = Some(Arc::new(config));
    }

    #[must_use]
    pub const fn is_initialized(&self) -> bool {
        self.config.is_some()
    }

    #[must_use]
    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    #[must_use]
    pub const fn states(&self) -> &StateStore {
        &self.states
    }

    /// Build a login server for `provider`
    ///
    /// Fails with `NotInitialized`, `UndefinedProvider` or
    /// `MissingCredentials`, checked in that order.
    pub fn new_server(&self, provider: ProviderId) -> Result<Server> {
        let config = self.config.as_ref().ok_or(Error::NotInitialized)?;

        let factory = self
            .registry
            .factory(provider)
            .ok_or_else(|| Error::UndefinedProvider(format!("{provider} is not implemented")))?;

        let credentials = config
            .credentials(provider)
            .ok_or_else(|| Error::UndefinedProvider(format!("{provider} has no configuration slot")))?;

        if let Some(field) = credentials.missing_field() {
            return Err(Error::MissingCredentials { provider, field });
        }

        debug!(%provider, "Creating OAuth2 login server");

        let adapter = factory(credentials.clone(), self.transport.clone());
        Ok(Server::new(adapter, self.states.clone()))
    }

    /// Same as [`Self::new_server`], selecting the provider by numeric code
    pub fn new_server_by_code(&self, code: i8) -> Result<Server> {
        self.new_server(ProviderId::try_from(code)?)
    }
}

// ============================================================================
// Process-wide entry points
// ============================================================================

static GLOBAL: OnceLock<LoginService> = OnceLock::new();

/// Initialize the process-wide login service
///
/// Uses the default reqwest transport. Must be called once, before any
/// [`new_server`] call; a second call fails with `AlreadyInitialized`.
pub fn init(config: OAuth2Config) -> Result<()> {
    let mut service = LoginService::new(Arc::new(ReqwestTransport::new()?));
    service.init(config);
    GLOBAL.set(service).map_err(|_| Error::AlreadyInitialized)
}

/// Initialize the process-wide login service with a prepared instance
pub fn init_with(service: LoginService) -> Result<()> {
    if !service.is_initialized() {
        return Err(Error::NotInitialized);
    }
    GLOBAL.set(service).map_err(|_| Error::AlreadyInitialized)
}

/// Build a login server from the process-wide service
pub fn new_server(provider: ProviderId) -> Result<Server> {
    GLOBAL
        .get()
        .ok_or(Error::NotInitialized)?
        .new_server(provider)
}
