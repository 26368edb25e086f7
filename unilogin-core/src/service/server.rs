//! Caller-facing facade over one provider adapter

use tracing::{debug, info, instrument};

use crate::logging::generate_trace_id;
use crate::models::{ProviderId, Userinfo};
use crate::oauth2::{Provider, StatePolicy, StateStore};
use crate::Result;

/// Authorization URL together with the state it carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub url: String,
    /// Present for providers that send a `state` parameter
    pub state: Option<String>,
}

/// Login server for one provider
///
/// Built by [`crate::service::LoginService::new_server`]. Holds no
/// per-request state, so independent servers can be used concurrently.
pub struct Server {
    provider: Box<dyn Provider>,
    provider_id: ProviderId,
    states: StateStore,
}

impl Server {
    pub(crate) fn new(provider: Box<dyn Provider>, states: StateStore) -> Self {
        let provider_id = provider.provider_id();
        Self {
            provider,
            provider_id,
            states,
        }
    }

    #[must_use]
    pub const fn provider_id(&self) -> ProviderId {
        self.provider_id
    }

    #[must_use]
    pub fn state_policy(&self) -> StatePolicy {
        self.provider.state_policy()
    }

    /// Authorization URL to send the user to
    pub fn redirect_url(&self) -> Result<String> {
        self.authorization().map(|request| request.url)
    }

    /// Authorization URL plus the state to expect on callback
    ///
    /// Random states are recorded in the shared [`StateStore`].
    pub fn authorization(&self) -> Result<AuthorizationRequest> {
        let (url, state) = match self.provider.state_policy() {
            StatePolicy::None => (self.provider.redirect_url(None)?, None),
            StatePolicy::Fixed(value) => (self.provider.redirect_url(None)?, Some(value.to_string())),
            StatePolicy::Random => {
                let state = self.states.issue(self.provider_id);
                (self.provider.redirect_url(Some(&state))?, Some(state))
            }
        };

        debug!(provider = %self.provider_id, "Built authorization URL");

        Ok(AuthorizationRequest { url, state })
    }

    /// Exchange the authorization code for normalized user info
    #[instrument(name = "oauth2_login", skip_all, fields(provider = %self.provider_id, trace_id = %generate_trace_id()))]
    pub async fn get_userinfo(&self, code: &str) -> Result<Userinfo> {
        let userinfo = self.provider.get_userinfo(code).await?;
        info!(openid = %userinfo.openid, "OAuth2 login succeeded");
        Ok(userinfo)
    }

    /// Verify the callback `state`, then exchange the code
    ///
    /// No request is sent when the state is rejected.
    pub async fn get_userinfo_with_state(&self, code: &str, state: Option<&str>) -> Result<Userinfo> {
        self.states
            .check(self.provider_id, self.provider.state_policy(), state)?;
        self.get_userinfo(code).await
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("provider_id", &self.provider_id)
            .finish_non_exhaustive()
    }
}
