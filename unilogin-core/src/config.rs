use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::models::ProviderId;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub logging: LoggingConfig,
    pub http: HttpConfig,
    pub state: StateConfig,
    pub oauth2: OAuth2Config,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

/// Outbound HTTP settings shared by every provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 5,
            user_agent: "unilogin".to_string(),
        }
    }
}

impl HttpConfig {
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Anti-forgery state settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StateConfig {
    pub ttl_seconds: u64,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self { ttl_seconds: 600 }
    }
}

impl StateConfig {
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Client credentials registered with one provider
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    #[serde(alias = "id")]
    pub client_id: String,
    #[serde(alias = "secret", skip_serializing)]
    pub client_secret: String,
    pub redirect_url: String,
}

impl Credentials {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            redirect_url: redirect_url.into(),
        }
    }

    /// Name of the first empty field, if any
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.client_id.is_empty() {
            Some("client_id")
        } else if self.client_secret.is_empty() {
            Some("client_secret")
        } else if self.redirect_url.is_empty() {
            Some("redirect_url")
        } else {
            None
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.missing_field().is_none()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[redacted]")
            .field("redirect_url", &self.redirect_url)
            .finish()
    }
}

/// `OAuth2` configuration
///
/// One credential triple per implemented provider.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OAuth2Config {
    pub google: Credentials,
    pub github: Credentials,
    pub gitee: Credentials,
    #[serde(alias = "dingding")]
    pub dingtalk: Credentials,
    pub feishu: Credentials,
}

impl OAuth2Config {
    /// Credentials for a provider, `None` for reserved providers
    #[must_use]
    pub const fn credentials(&self, provider: ProviderId) -> Option<&Credentials> {
        match provider {
            ProviderId::Google => Some(&self.google),
            ProviderId::GitHub => Some(&self.github),
            ProviderId::Gitee => Some(&self.gitee),
            ProviderId::DingTalk => Some(&self.dingtalk),
            ProviderId::Feishu => Some(&self.feishu),
            ProviderId::WeChat | ProviderId::QQ | ProviderId::Weibo => None,
        }
    }

    /// Providers whose credential triple is complete
    #[must_use]
    pub fn configured_providers(&self) -> Vec<ProviderId> {
        ProviderId::ALL
            .into_iter()
            .filter(|id| self.credentials(*id).is_some_and(Credentials::is_complete))
            .collect()
    }
}

impl Config {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        Self::load_with(config_file, Self::environment())
    }

    /// `UNILOGIN_OAUTH2__GITHUB__CLIENT_ID`, `UNILOGIN_HTTP__TIMEOUT_SECONDS`, ...
    ///
    /// Values are kept as strings: numeric fields are converted when
    /// deserializing, so credentials like `00123` arrive unchanged.
    fn environment() -> Environment {
        Environment::with_prefix("UNILOGIN")
            .prefix_separator("_")
            .separator("__")
    }

    fn load_with(config_file: Option<&str>, environment: Environment) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        let config = builder.add_source(environment).build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.http.timeout(), Duration::from_secs(5));
        assert_eq!(config.state.ttl(), Duration::from_secs(600));
        assert_eq!(config.logging.level, "info");
        assert!(config.oauth2.configured_providers().is_empty());
    }

    #[test]
    fn test_missing_field_order() {
        let mut creds = Credentials::default();
        assert_eq!(creds.missing_field(), Some("client_id"));

        creds.client_id = "id".to_string();
        assert_eq!(creds.missing_field(), Some("client_secret"));

        creds.client_secret = "secret".to_string();
        assert_eq!(creds.missing_field(), Some("redirect_url"));

        creds.redirect_url = "https://app.example.com/callback".to_string();
        assert!(creds.is_complete());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("id", "top-secret", "https://app.example.com/cb");
        let printed = format!("{creds:?}");

        assert!(printed.contains("[redacted]"));
        assert!(!printed.contains("top-secret"));
    }

    #[test]
    fn test_serialized_config_omits_secret() {
        let mut config = Config::default();
        config.oauth2.github = Credentials::new("gh-id", "top-secret", "https://app.example.com/cb");

        let json = serde_json::to_string(&config).unwrap();

        assert!(json.contains("gh-id"));
        assert!(!json.contains("top-secret"));
        assert!(!json.contains("client_secret"));
    }

    #[test]
    fn test_env_credentials_are_not_reparsed() {
        let vars: config::Map<String, String> = [
            ("UNILOGIN_OAUTH2__GITHUB__CLIENT_ID", "00123456"),
            ("UNILOGIN_OAUTH2__GITHUB__CLIENT_SECRET", "123456789012345678901234"),
            ("UNILOGIN_OAUTH2__GITHUB__REDIRECT_URL", "https://app.example.com/github"),
            ("UNILOGIN_HTTP__TIMEOUT_SECONDS", "9"),
            ("UNILOGIN_STATE__TTL_SECONDS", "120"),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

        let config = Config::load_with(None, Config::environment().source(Some(vars))).unwrap();

        assert_eq!(config.oauth2.github.client_id, "00123456");
        assert_eq!(config.oauth2.github.client_secret, "123456789012345678901234");
        assert_eq!(config.http.timeout_seconds, 9);
        assert_eq!(config.state.ttl(), Duration::from_secs(120));
    }

    #[test]
    fn test_reserved_providers_have_no_credentials() {
        let config = OAuth2Config::default();

        assert!(config.credentials(ProviderId::WeChat).is_none());
        assert!(config.credentials(ProviderId::Google).is_some());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            r"
http:
  timeout_seconds: 3
oauth2:
  github:
    id: gh-id
    secret: gh-secret
    redirect_url: https://app.example.com/github
  dingding:
    client_id: dt-id
    client_secret: dt-secret
    redirect_url: https://app.example.com/dingtalk
"
        )
        .unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();

        assert_eq!(config.http.timeout_seconds, 3);
        assert_eq!(config.oauth2.github.client_id, "gh-id");
        assert_eq!(config.oauth2.github.client_secret, "gh-secret");
        assert_eq!(config.oauth2.dingtalk.client_id, "dt-id");
        assert_eq!(
            config.oauth2.configured_providers(),
            vec![ProviderId::GitHub, ProviderId::DingTalk]
        );
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = Config::load(Some("/nonexistent/unilogin.yaml")).unwrap();
        assert_eq!(config.logging.format, "pretty");
    }
}
