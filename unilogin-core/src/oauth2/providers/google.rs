//! Google `OAuth2` provider
//!
//! <https://developers.google.com/identity/protocols/oauth2/web-server>

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use super::{bearer, ensure_profile, ensure_token, form_token_request, oauth_error, with_query};
use crate::config::Credentials;
use crate::models::{ProviderId, Userinfo};
use crate::oauth2::{HttpRequest, HttpTransport, Provider};
use crate::{Error, Result};

pub const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/auth";
pub const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
pub const PROFILE_SCOPE: &str = "https://www.googleapis.com/auth/userinfo.profile";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleTokenResponse {
    access_token: String,
    error: String,
    error_description: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleApiError {
    code: i64,
    message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GoogleUser {
    id: String,
    name: String,
    picture: String,
    error: GoogleApiError,
}

/// Google `OAuth2` provider
pub struct GoogleProvider {
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
}

impl GoogleProvider {
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
        let token: GoogleTokenResponse = response.json("google token response")?;

        if let Some(message) = oauth_error(&token.error, &token.error_description) {
            return Err(Error::ProviderToken(message));
        }

        ensure_token(&response, token.access_token)
    }
}

#[async_trait]
impl Provider for GoogleProvider {
    fn provider_id(&self) -> ProviderId {
        ProviderId::Google
    }

    fn redirect_url(&self, _state: Option<&str>) -> Result<String> {
        with_query(
            AUTHORIZE_URL,
            &[
                ("response_type", "code"),
                ("client_id", self.credentials.client_id.as_str()),
                ("redirect_uri", self.credentials.redirect_url.as_str()),
                ("scope", PROFILE_SCOPE),
                ("access_type", "offline"),
            ],
        )
    }

    async fn get_userinfo(&self, code: &str) -> Result<Userinfo> {
        let token = self.token(code).await.map_err(Error::token_exchange)?;
        debug!("Google access token obtained");

        let request = HttpRequest::get(USERINFO_URL).header("Authorization", bearer(&token));
        let response = self.transport.send(request).await?;
        let user: GoogleUser = response.json("google userinfo response")?;

        if user.error.code != 0 {
            return Err(Error::ProviderProfile(user.error.message));
        }

        ensure_profile(&response)?;

        Ok(Userinfo {
            openid: user.id,
            nick_name: user.name,
            avatar: user.picture,
            ..Default::default()
        })
    }
}

/// Factory function for Google provider
pub fn google_factory(
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
) -> Box<dyn Provider> {
    Box::new(GoogleProvider::create(credentials, transport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{query_pairs, test_credentials, ScriptedTransport};

    fn provider(transport: &Arc<ScriptedTransport>) -> GoogleProvider {
        GoogleProvider::create(test_credentials("google"), transport.clone())
    }

    #[test]
    fn test_redirect_url() {
        let transport = ScriptedTransport::new();
        let url = provider(&transport).redirect_url(None).unwrap();

        assert!(url.starts_with(AUTHORIZE_URL));
        let params = query_pairs(&url);
        assert_eq!(params["response_type"], "code");
        assert_eq!(params["client_id"], "google-client-id");
        assert_eq!(params["redirect_uri"], "https://app.example.com/callback/google");
        assert_eq!(params["scope"], PROFILE_SCOPE);
        assert_eq!(params["access_type"], "offline");
        assert!(!params.contains_key("state"));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_get_userinfo() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, r#"{"access_token":"ya29.token","expires_in":3599,"token_type":"Bearer"}"#);
        transport.push_json(
            200,
            r#"{"id":"1098765","name":"Ada Lovelace","picture":"https://lh3.googleusercontent.com/a/pic"}"#,
        );

        let info = provider(&transport).get_userinfo("4/0code").await.unwrap();

        assert_eq!(info.openid, "1098765");
        assert_eq!(info.nick_name, "Ada Lovelace");
        assert_eq!(info.avatar, "https://lh3.googleusercontent.com/a/pic");
        assert!(info.union_id.is_empty());
        assert!(info.mobile.is_empty());

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, TOKEN_URL);
        assert!(requests[0].body.as_deref().unwrap().contains("code=4%2F0code"));
        assert_eq!(requests[1].url, USERINFO_URL);
        assert_eq!(requests[1].header_value("Authorization"), Some("Bearer ya29.token"));
    }

    #[tokio::test]
    async fn test_token_error_stops_before_profile() {
        let transport = ScriptedTransport::new();
        transport.push_json(400, r#"{"error":"invalid_grant","error_description":"Bad Request"}"#);

        let err = provider(&transport).get_userinfo("expired").await.unwrap_err();

        assert!(err.is_token_exchange());
        assert!(err.to_string().contains("Bad Request"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_profile_error_object() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, r#"{"access_token":"ya29.token"}"#);
        transport.push_json(
            401,
            r#"{"error":{"code":401,"message":"Request had invalid authentication credentials.","status":"UNAUTHENTICATED"}}"#,
        );

        let err = provider(&transport).get_userinfo("code").await.unwrap_err();

        assert!(matches!(err, Error::ProviderProfile(ref m) if m.contains("invalid authentication")));
    }

    #[tokio::test]
    async fn test_empty_access_token_is_error() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, r#"{"token_type":"Bearer"}"#);

        let err = provider(&transport).get_userinfo("code").await.unwrap_err();

        assert!(err.is_token_exchange());
        assert!(err.to_string().contains("no access token"));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_profile_status_without_error_object() {
        let transport = ScriptedTransport::new();
        transport.push_json(200, r#"{"access_token":"ya29.token"}"#);
        transport.push_json(503, "{}");

        let err = provider(&transport).get_userinfo("code").await.unwrap_err();

        assert!(matches!(err, Error::ProviderProfile(ref m) if m.contains("HTTP 503")));
    }
}
