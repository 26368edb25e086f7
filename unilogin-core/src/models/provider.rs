//! Provider identifiers
//!
//! The numeric codes are part of the public surface: callers persist them
//! and pass them back to select an adapter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// `OAuth2` provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(i8)]
pub enum ProviderId {
    /// Google
    Google = 1,
    /// WeChat (reserved)
    WeChat = 2,
    /// GitHub
    GitHub = 3,
    /// QQ (reserved)
    QQ = 4,
    /// Weibo (reserved)
    Weibo = 5,
    /// DingTalk
    DingTalk = 6,
    /// Gitee
    Gitee = 7,
    /// Feishu
    Feishu = 8,
}

impl ProviderId {
    pub const ALL: [Self; 8] = [
        Self::Google,
        Self::WeChat,
        Self::GitHub,
        Self::QQ,
        Self::Weibo,
        Self::DingTalk,
        Self::Gitee,
        Self::Feishu,
    ];

    #[must_use]
    pub const fn code(self) -> i8 {
        self as i8
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::WeChat => "wechat",
            Self::GitHub => "github",
            Self::QQ => "qq",
            Self::Weibo => "weibo",
            Self::DingTalk => "dingtalk",
            Self::Gitee => "gitee",
            Self::Feishu => "feishu",
        }
    }

    /// Whether this crate ships an adapter for the provider
    #[must_use]
    pub const fn is_implemented(self) -> bool {
        !matches!(self, Self::WeChat | Self::QQ | Self::Weibo)
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<i8> for ProviderId {
    type Error = Error;

    fn try_from(code: i8) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|id| id.code() == code)
            .ok_or_else(|| Error::UndefinedProvider(format!("unknown provider code {code}")))
    }
}

impl FromStr for ProviderId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Ok(code) = s.parse::<i8>() {
            return Self::try_from(code);
        }

        match s.to_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "wechat" | "weixin" => Ok(Self::WeChat),
            "github" => Ok(Self::GitHub),
            "qq" => Ok(Self::QQ),
            "weibo" => Ok(Self::Weibo),
            "dingtalk" | "dingding" => Ok(Self::DingTalk),
            "gitee" => Ok(Self::Gitee),
            "feishu" => Ok(Self::Feishu),
            other => Err(Error::UndefinedProvider(format!("unknown provider name {other}"))),
        }
    }
}
