//! Authentication Module
//! JWT sessions, betting/customer roles and subscription windows

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use api::AuthState;
pub use jwt::JwtHandler;
pub use middleware::auth_middleware;
pub use models::{Claims, User, UserRole};
pub use user_store::UserStore;
