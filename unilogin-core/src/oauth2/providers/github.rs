//! GitHub `OAuth2` provider
//!
//! <https://docs.github.com/en/apps/oauth-apps/building-oauth-apps/authorizing-oauth-apps>

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{bearer, ensure_profile, ensure_token, form_token_request, oauth_error, with_query};
use crate::config::Credentials;
use crate::models::{ProviderId, Userinfo};
use crate::oauth2::http::CONTENT_TYPE_JSON;
use crate::oauth2::{HttpRequest, HttpTransport, Provider, StatePolicy};
use crate::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://github.com/login/oauth/authorize";
pub const TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
pub const USERINFO_URL: &str = "https://api.github.com/user";

// The GitHub API rejects requests without a User-Agent
const USER_AGENT: &str = "unilogin";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GitHubTokenResponse {
    access_token: String,
    error: String,
    error_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GitHubUser {
    login: String,
    id: i64,
    avatar_url: String,
    message: String,
}

/// GitHub `OAuth2` provider
pub struct GitHubProvider {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

impl GitHubProvider {
    #[must_use]
    pub fn create(credentials: Credentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    async fn token(&self, code: &str) -> Result<String> {
        let request = form_token_request(TOKEN_URL, code, &self.credentials)?;
        let response = self.transport.send(request).await?;
        let token: GitHubTokenResponse = response.json("github token response")?;

        if let Some(message) = oauth_error(&token.error, &token.error_description) {
            return Err(Error::ProviderToken(message));
        }

        ensure_token(&response, token.access_token)
    }
}

#[async_trait]
impl Provider for GitHubProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::GitHub
    }

    fn state_policy(&self) -> StatePolicy {
        StatePolicy::Random
    }

    fn redirect_url(&self, state: Option<&str>) -> Result<String> {
        with_query(
            AUTHORIZE_URL,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("scope", "user"),
                ("state", state.unwrap_or_default()),
            ],
        )
    }

    async fn get_userinfo(&self, code: &str) -> Result<Userinfo> {
        let token = self.token(code).await.map_err(Error::token_exchange)?;
        debug!("GitHub access token obtained");

        let request = HttpRequest::get(USERINFO_URL)
            .header("Authorization", bearer(&token))
            .header("Accept", CONTENT_TYPE_JSON)
            .header("User-Agent", USER_AGENT);
        let response = self.transport.send(request).await?;
        let user: GitHubUser = response.json("github userinfo response")?;

        if !user.message.is_empty() {
            return Err(Error::ProviderProfile(user.message));
        }

        ensure_profile(&response)?;

        Ok(Userinfo {
            openid: user.id.to_string(),
            nick_name: user.login,
            avatar: user.avatar_url,
            ..Default::default()
        })
    }
}

/// Factory function for GitHub provider
pub fn github_factory(
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
) -> Box<dyn Provider> {
    Box::new(GitHubProvider::create(credentials, transport))
}
