pub mod login;
pub mod server;

pub use login::LoginService;
pub use server::{AuthorizationRequest, Server};
