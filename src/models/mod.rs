//! Data models for user identities.

pub mod user;

pub use user::*;
