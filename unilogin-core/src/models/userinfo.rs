//! Normalized user profile shared by every provider

use serde::{Deserialize, Serialize};

/// `OAuth2` user info after normalization
///
/// Fields a provider does not supply are left empty
/// (Google, GitHub and Gitee never fill `union_id` or `mobile`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Userinfo {
    pub openid: String,
    pub union_id: String,
    pub nick_name: String,
    pub avatar: String,
    pub mobile: String,
}
