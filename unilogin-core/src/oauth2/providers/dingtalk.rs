//! DingTalk `OAuth2` provider
//!
//! <https://open.dingtalk.com/document/orgapp/tutorial-obtaining-user-personal-information>
//!
//! Unlike the other providers, DingTalk takes a camelCase JSON token request
//! and authenticates profile calls with `x-acs-dingtalk-access-token`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use super::{ensure_profile, ensure_token, with_query};
use crate::config::Credentials;
use crate::models::{ProviderId, Userinfo};
use crate::oauth2::http::CONTENT_TYPE_JSON;
use crate::oauth2::{HttpRequest, HttpTransport, Provider, StatePolicy};
use crate::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://login.dingtalk.com/oauth2/auth";
pub const TOKEN_URL: &str = "https://api.dingtalk.com/v1.0/oauth2/userAccessToken";
pub const USERINFO_URL: &str = "https://api.dingtalk.com/v1.0/contact/users/me";
pub const ACCESS_TOKEN_HEADER: &str = "x-acs-dingtalk-access-token";
pub const FIXED_STATE: &str = "authCode";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DingTalkTokenRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    code: &'a str,
    grant_type: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DingTalkTokenResponse {
    access_token: String,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct DingTalkUser {
    nick: String,
    union_id: String,
    avatar_url: String,
    open_id: String,
    mobile: String,
    message: String,
}

/// DingTalk `OAuth2` provider
pub struct DingTalkProvider {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

impl DingTalkProvider {
    #[must_use]
    pub fn create(credentials: Credentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    async fn token(&self, code: &str) -> Result<String> {
        let body = serde_json::to_string(&DingTalkTokenRequest {
            client_id: &self.credentials.client_id,
            client_secret: &self.credentials.client_secret,
            code,
            grant_type: "authorization_code",
        })?;

        let request = HttpRequest::post(TOKEN_URL)
            .header("Content-Type", CONTENT_TYPE_JSON)
            .body(body);
        let response = self.transport.send(request).await?;
        let token: DingTalkTokenResponse = response.json("dingtalk token response")?;

        if !token.message.is_empty() {
            return Err(Error::ProviderToken(token.message));
        }

        ensure_token(&response, token.access_token)
    }
}

#[async_trait]
impl Provider for DingTalkProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::DingTalk
    }

    fn state_policy(&self) -> StatePolicy {
        StatePolicy::Fixed(FIXED_STATE)
    }

    fn redirect_url(&self, _state: Option<&str>) -> Result<String> {
        with_query(
            AUTHORIZE_URL,
            &[
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("client_id", self.credentials.client_id.as_str()),
                ("response_type", "code"),
                ("scope", "openid"),
                ("state", FIXED_STATE),
                ("prompt", "consent"),
            ],
        )
    }

    async fn get_userinfo(&self, code: &str) -> Result<Userinfo> {
        let token = self.token(code).await.map_err(Error::token_exchange)?;
        debug!("DingTalk access token obtained");

        let request = HttpRequest::get(USERINFO_URL).header(ACCESS_TOKEN_HEADER, token);
        let response = self.transport.send(request).await?;
        let user: DingTalkUser = response.json("dingtalk userinfo response")?;

        if !user.message.is_empty() {
            return Err(Error::ProviderProfile(user.message));
        }

        ensure_profile(&response)?;

        Ok(Userinfo {
            openid: user.open_id,
            union_id: user.union_id,
            nick_name: user.nick,
            avatar: user.avatar_url,
            mobile: user.mobile,
        })
    }
}

/// Factory function for DingTalk provider
pub fn dingtalk_factory(
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
) -> Box<dyn Provider> {
    Box::new(DingTalkProvider::create(credentials, transport))
}
