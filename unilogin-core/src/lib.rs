//! Unified "login with provider" `OAuth2` client
//!
//! ```ignore
//! let mut service = LoginService::new(Arc::new(ReqwestTransport::new()?));
//! service.init(config.oauth2);
//!
//! let server = service.new_server(ProviderId::GitHub)?;
//! let redirect = server.authorization()?;
//! // ... user comes back with `code` and `state`
//! let userinfo = server.get_userinfo_with_state(&code, Some(&state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod oauth2;
pub mod service;

#[cfg(test)]
pub mod test_helpers;

pub use config::{Config, Credentials, OAuth2Config};
pub use error::{Error, Result};
pub use models::{ProviderId, Userinfo};
pub use oauth2::{HttpRequest, HttpResponse, HttpTransport, Provider, ProviderRegistry, ReqwestTransport};
pub use service::login::{init, init_with, new_server};
pub use service::{AuthorizationRequest, LoginService, Server};
