//! Test helpers and fixtures for unilogin-core tests
//!
//! Provides a scripted transport that records every request, plus
//! credential fixtures.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::config::{Credentials, OAuth2Config};
use crate::oauth2::{HttpRequest, HttpResponse, HttpTransport};
use crate::{Error, Result};

/// Credentials named after the provider, e.g. `github-client-id`
pub fn test_credentials(name: &str) -> Credentials {
    Credentials::new(
        format!("{name}-client-id"),
        format!("{name}-client-secret"),
        format!("https://app.example.com/callback/{name}"),
    )
}

/// Configuration with every implemented provider filled in
pub fn full_oauth2_config() -> OAuth2Config {
    OAuth2Config {
        google: test_credentials("google"),
        github: test_credentials("github"),
        gitee: test_credentials("gitee"),
        dingtalk: test_credentials("dingtalk"),
        feishu: test_credentials("feishu"),
    }
}

/// Decoded query parameters of a URL
pub fn query_pairs(url: &str) -> HashMap<String, String> {
    url::Url::parse(url)
        .expect("valid URL")
        .query_pairs()
        .into_owned()
        .collect()
}

/// Transport replaying queued responses in order
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<HttpResponse>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push_json(&self, status: u16, body: &str) {
        self.responses
            .lock()
            .push_back(Ok(HttpResponse::new(status, body)));
    }

    pub fn push_error(&self, err: Error) {
        self.responses.lock().push_back(Err(err));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::Network("no scripted response left".to_string())))
    }
}
