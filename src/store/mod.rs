//! Credential store: the persistence boundary for user identities.

mod memory;

pub use memory::MemoryCredentialStore;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{NewUser, UserRecord};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username already taken")]
    DuplicateUsername,

    #[error("user not found")]
    NotFound,

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// User identity storage. Implementations enforce username uniqueness atomically
/// (on the normalized username) and leave the store unchanged on conflict.
#[async_trait]
pub trait CredentialStore: Send + Sync + 'static {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord>;

    async fn find_by_username(&self, username: &str) -> StoreResult<UserRecord>;

    async fn find_by_id(&self, id: Uuid) -> StoreResult<UserRecord>;

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> StoreResult<()>;
}
