//! Gitee `OAuth2` provider
//!
//! <https://gitee.com/api/v5/oauth_doc>

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{ensure_profile, ensure_token, form_token_request, oauth_error, with_query};
use crate::config::Credentials;
use crate::models::{ProviderId, Userinfo};
use crate::oauth2::{HttpRequest, HttpTransport, Provider};
use crate::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://gitee.com/oauth/authorize";
pub const TOKEN_URL: &str = "https://gitee.com/oauth/token";
pub const USERINFO_URL: &str = "https://gitee.com/api/v5/user";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteeTokenResponse {
    access_token: String,
    error: String,
    error_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GiteeUser {
    id: i64,
    name: String,
    avatar_url: String,
    message: String,
}

/// Gitee `OAuth2` provider
///
/// The profile endpoint takes the token as an `access_token` query parameter.
pub struct GiteeProvider {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

impl GiteeProvider {
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
        let token: GiteeTokenResponse = response.json("gitee token response")?;

        if let Some(message) = oauth_error(&token.error, &token.error_description) {
            return Err(Error::ProviderToken(message));
        }

        ensure_token(&response, token.access_token)
    }
}

#[async_trait]
impl Provider for GiteeProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Gitee
    }

    fn redirect_url(&self, _state: Option<&str>) -> Result<String> {
        with_query(
            AUTHORIZE_URL,
            &[
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("response_type", "code"),
            ],
        )
    }

    async fn get_userinfo(&self, code: &str) -> Result<Userinfo> {
        let token = self.token(code).await.map_err(Error::token_exchange)?;
        debug!("Gitee access token obtained");

        let url = with_query(USERINFO_URL, &[("access_token", token.as_str())])?;
        let response = self.transport.send(HttpRequest::get(url)).await?;
        let user: GiteeUser = response.json("gitee userinfo response")?;

        if !user.message.is_empty() {
            return Err(Error::ProviderProfile(user.message));
        }

        ensure_profile(&response)?;

        Ok(Userinfo {
            openid: user.id.to_string(),
            nick_name: user.name,
            avatar: user.avatar_url,
            ..Default::default()
        })
    }
}

/// Factory function for Gitee provider
pub fn gitee_factory(
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
) -> Box<dyn Provider> {
    Box::new(GiteeProvider::create(credentials, transport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{query_pairs, test_credentials, ScriptedTransport};

    fn provider(transport: &Arc<ScriptedTransport>) -> GiteeProvider {
        GiteeProvider::create(test_credentials("gitee"), transport.clone())
    }

    #[test]
    fn test_redirect_url() {
        let transport = ScriptedTransport::new();
        let url = provider(&transport).redirect_url(None).unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        let params = query_pairs(&url);
        assert_eq!(params.len(), 3);
        assert_eq!(params["client_id"], "gitee-client-id");
        assert_eq!(params["redirect_uri"], "https://app.example.com/callback/gitee");
        assert_eq!(params["response_type"], "code");
    }

    #[tokio::test]
    async fn test_get_userinfo_uses_query_token() {
        let transport = ScriptedTransport::new();
        transport.push_json(
            200,
            r#"{"access_token":"gitee-token","token_type":"bearer","expires_in":86400,"created_at":1700000000}"#,
        );
        transport.push_json(
            200,
            r#"{"id":7788,"login":"liming","name":"Li Ming","avatar_url":"https://gitee.com/assets/no_portrait.png"}"#,
        );

        let info = provider(&transport).get_userinfo("code").await.unwrap();

        assert_eq!(info.openid, "7788");
        assert_eq!(info.nick_name, "Li Ming");
        assert_eq!(info.avatar, "https://gitee.com/assets/no_portrait.png");

        let requests = transport.requests();
        assert_eq!(requests[1].url, format!("{USERINFO_URL}?access_token=gitee-token"));
        assert!(requests[1].header_value("Authorization").is_none());
    }

    #[tokio::test]
    async fn test_token_error_without_description() {
        let transport = ScriptedTransport::new();
        transport.push_json(401, r#"{"error":"invalid_grant"}"#);

        let err = provider(&transport).get_userinfo("code").await.unwrap_err();

        assert!(err.is_token_exchange());
        assert!(err.to_string().contains("invalid_grant"));
    }

    #[tokio::test]
    async fn test_profile_message_is_error() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, r#"{"access_token":"gitee-token"}"#);
        transport.push_json(401, r#"{"message":"401 Unauthorized: Access token is expired"}"#);

        let err = provider(&transport).get_userinfo("code").await.unwrap_err();

        assert!(matches!(err, Error::ProviderProfile(ref m) if m.contains("expired")));
    }

    #[tokio::test]
    async fn test_failed_profile_status_without_message() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, r#"{"access_token":"gitee-token"}"#);
        transport.push_json(500, r#"{"id":0}"#);

        let err = provider(&transport).get_userinfo("code").await.unwrap_err();

        assert!(matches!(err, Error::ProviderProfile(ref m) if m.contains("HTTP 500")));
    }
}
