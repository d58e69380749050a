//! In-process credential store, for single-node development and tests.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use super::{CredentialStore, StoreError, StoreResult};
use crate::models::{normalize_username, NewUser, UserRecord};

#[derive(Default)]
struct Inner {
    users: HashMap<Uuid, UserRecord>,
    /// normalized username -> user id
    by_username: HashMap<String, Uuid>,
}

/// Credential store backed by process memory. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<Inner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn update<F>(&self, id: Uuid, f: F) -> StoreResult<()>
    where
        F: FnOnce(&mut UserRecord),
    {
        let mut inner = self.inner.write().await;
        let user = inner.users.get_mut(&id).ok_or(StoreError::NotFound)?;
        f(user);
        user.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let key = normalize_username(&user.username);
        // Check and insert under one write guard.
        let mut inner = self.inner.write().await;
        if inner.by_username.contains_key(&key) {
            return Err(StoreError::DuplicateUsername);
        }
        let now = Utc::now();
        let record = UserRecord {
            id: Uuid::new_v4(),
            username: user.username.trim().to_string(),
            display_name: user.display_name,
            password_hash: user.password_hash,
            roles: user.roles,
            disabled: false,
            created_at: now,
            updated_at: now,
        };
        inner.by_username.insert(key, record.id);
        inner.users.insert(record.id, record.clone());
        debug!(user_id = %record.id, "user created");
        Ok(record)
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<UserRecord> {
        let inner = self.inner.read().await;
        inner
            .by_username
            .get(&normalize_username(username))
            .and_then(|id| inner.users.get(id))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<UserRecord> {
        self.inner
            .read()
            .await
            .users
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        self.update(id, |user| user.password_hash = password_hash.to_string())
            .await
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> StoreResult<()> {
        self.update(id, |user| user.disabled = disabled).await
    }
}
