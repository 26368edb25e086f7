//! `OAuth2` provider implementations
//!
//! Each provider is implemented as a separate module with:
//! 1. Its own provider struct and private wire schemas
//! 2. A `create()` constructor
//! 3. A public factory function for registration

pub mod dingtalk;
pub mod feishu;
pub mod gitee;
pub mod github;
pub mod google;

pub use dingtalk::DingTalkProvider;
pub use feishu::FeishuProvider;
pub use gitee::GiteeProvider;
pub use github::GitHubProvider;
pub use google::GoogleProvider;

use serde::Serialize;
use url::Url;

use crate::models::ProviderId;
use crate::oauth2::http::{HttpRequest, HttpResponse, CONTENT_TYPE_FORM, CONTENT_TYPE_JSON};
use crate::oauth2::ProviderRegistry;
use crate::{Error, Result};

/// Register every adapter shipped by this crate
pub fn register_builtin(registry: &mut ProviderRegistry) {
    registry.register(ProviderId::Google, google::google_factory);
    registry.register(ProviderId::GitHub, github::github_factory);
    registry.register(ProviderId::Gitee, gitee::gitee_factory);
    registry.register(ProviderId::DingTalk, dingtalk::dingtalk_factory);
    registry.register(ProviderId::Feishu, feishu::feishu_factory);
}

/// Append query parameters to a fixed endpoint
fn with_query(base: &str, params: &[(&str, &str)]) -> Result<String> {
    let mut url = Url::parse(base)?;
    url.query_pairs_mut().extend_pairs(params);
    Ok(url.into())
}

/// Standard form-encoded `authorization_code` token request
#[derive(Serialize)]
struct FormTokenRequest<'a> {
    code: &'a str,
    client_id: &'a str,
    client_secret: &'a str,
    redirect_uri: &'a str,
    grant_type: &'a str,
}

fn form_token_request(
    token_url: &str,
    code: &str,
    credentials: &crate::config::Credentials,
) -> Result<HttpRequest> {
    let body = serde_urlencoded::to_string(FormTokenRequest {
        code,
        client_id: &credentials.client_id,
        client_secret: &credentials.client_secret,
        redirect_uri: &credentials.redirect_url,
        grant_type: "authorization_code",
    })?;

    Ok(HttpRequest::post(token_url)
        .header("Accept", CONTENT_TYPE_JSON)
        .header("Content-Type", CONTENT_TYPE_FORM)
        .body(body))
}

/// Error text of an `error` / `error_description` pair, if either is set
fn oauth_error(error: &str, description: &str) -> Option<String> {
    if !description.is_empty() {
        Some(description.to_string())
    } else if !error.is_empty() {
        Some(error.to_string())
    } else {
        None
    }
}

/// Access token of a token response that reported no provider error
///
/// A non-2xx status or an empty token is a failure even when the body
/// decoded cleanly.
fn ensure_token(response: &HttpResponse, access_token: String) -> Result<String> {
    if !response.is_success() {
        return Err(Error::ProviderToken(format!(
            "token endpoint returned HTTP {}",
            response.status
        )));
    }
    if access_token.is_empty() {
        return Err(Error::ProviderToken(
            "token endpoint returned no access token".to_string(),
        ));
    }
    Ok(access_token)
}

/// Reject a non-2xx profile response that carried no recognised error field
fn ensure_profile(response: &HttpResponse) -> Result<()> {
    if response.is_success() {
        Ok(())
    } else {
        Err(Error::ProviderProfile(format!(
            "userinfo endpoint returned HTTP {}",
            response.status
        )))
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}
