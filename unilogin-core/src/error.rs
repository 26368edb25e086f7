use thiserror::Error;

use crate::models::ProviderId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("OAuth2 configuration not initialized, call init first")]
    NotInitialized,

    #[error("OAuth2 configuration already initialized")]
    AlreadyInitialized,

    #[error("Undefined provider: {0}")]
    UndefinedProvider(String),

    #[error("Missing credentials for {provider}: {field} is empty")]
    MissingCredentials {
        provider: ProviderId,
        field: &'static str,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Deserialization error: {context}")]
    Deserialization { context: String },

    #[error("Provider token error: {0}")]
    ProviderToken(String),

    #[error("Provider profile error: {0}")]
    ProviderProfile(String),

    #[error("Token exchange failed: {0}")]
    TokenExchange(#[source] Box<Error>),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

impl Error {
    /// Wrap an error raised while exchanging the authorization code.
    pub fn token_exchange(err: Self) -> Self {
        Self::TokenExchange(Box::new(err))
    }

    /// True when the failure happened before an access token was obtained.
    #[must_use]
    pub const fn is_token_exchange(&self) -> bool {
        matches!(self, Self::TokenExchange(_))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidInput(format!("Malformed URL: {err}"))
    }
}

impl From<serde_urlencoded::ser::Error> for Error {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        Self::InvalidInput(format!("Form encoding failed: {err}"))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else {
            Self::Network(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
