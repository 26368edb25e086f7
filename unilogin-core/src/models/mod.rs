pub mod provider;
pub mod userinfo;

pub use provider::ProviderId;
pub use userinfo::Userinfo;
