pub mod auth;
pub mod password;
pub mod scheme;
pub mod token;

pub use auth::AuthService;
pub use password::PasswordHasher;
pub use scheme::{AuthScheme, AuthType, require_auth};
