//! Feishu `OAuth2` provider
//!
//! <https://open.feishu.cn/document/uAjLw4CM/ukTMukTMukTM/reference/authen-v1/login-overview>

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{bearer, ensure_profile, ensure_token, form_token_request, oauth_error, with_query};
use crate::config::Credentials;
use crate::models::{ProviderId, Userinfo};
use crate::oauth2::{HttpRequest, HttpTransport, Provider, StatePolicy};
use crate::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://passport.feishu.cn/suite/passport/oauth/authorize";
pub const TOKEN_URL: &str = "https://passport.feishu.cn/suite/passport/oauth/token";
pub const USERINFO_URL: &str = "https://passport.feishu.cn/suite/passport/oauth/userinfo";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeishuTokenResponse {
    access_token: String,
    error: String,
    error_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct FeishuUser {
    name: String,
    avatar_url: String,
    open_id: String,
    union_id: String,
    mobile: String,
    message: String,
}

/// Feishu `OAuth2` provider
pub struct FeishuProvider {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

impl FeishuProvider {
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
        let token: FeishuTokenResponse = response.json("feishu token response")?;

        if let Some(message) = oauth_error(&token.error, &token.error_description) {
            return Err(Error::ProviderToken(message));
        }

        ensure_token(&response, token.access_token)
    }
}

#[async_trait]
impl Provider for FeishuProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Feishu
    }

    fn state_policy(&self) -> StatePolicy {
        StatePolicy::Random
    }

    fn redirect_url(&self, state: Option<&str>) -> Result<String> {
        with_query(
            AUTHORIZE_URL,
            &[
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("response_type", "code"),
                ("state", state.unwrap_or_default()),
            ],
        )
    }

    async fn get_userinfo(&self, code: &str) -> Result<Userinfo> {
        let token = self.token(code).await.map_err(Error::token_exchange)?;
        debug!("Feishu access token obtained");

        let request = HttpRequest::get(USERINFO_URL).header("Authorization", bearer(&token));
        let response = self.transport.send(request).await?;
        let user: FeishuUser = response.json("feishu userinfo response")?;

        if !user.message.is_empty() {
            return Err(Error::ProviderProfile(user.message));
        }

        ensure_profile(&response)?;

        Ok(Userinfo {
            openid: user.open_id,
            union_id: user.union_id,
            nick_name: user.name,
            avatar: user.avatar_url,
            mobile: user.mobile,
        })
    }
}

/// Factory function for Feishu provider
pub fn feishu_factory(
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
) -> Box<dyn Provider> {
    Box::new(FeishuProvider::create(credentials, transport))
}
