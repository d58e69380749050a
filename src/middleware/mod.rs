//! Middleware: the authentication and authorization interceptor chain.

pub mod auth;

pub use auth::{authenticate, require_admin, require_role, AuthUser, ADMIN_ROLE};
