//! PostgreSQL credential store: users, roles, user_roles.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use tracing::debug;
use uuid::Uuid;

use super::DbPool;
use crate::models::{normalize_username, NewUser, UserRecord};
use crate::store::{CredentialStore, StoreError, StoreResult};

const SELECT_USER: &str = r#"
    SELECT u.id, u.username, u.display_name, u.password_hash, u.disabled, u.created_at, u.updated_at,
           COALESCE(array_agg(ur.role ORDER BY ur.role) FILTER (WHERE ur.role IS NOT NULL), '{}') AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
"#;

// ---- User ----

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub roles: Vec<String>,
}

impl From<UserRow> for UserRecord {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            display_name: row.display_name,
            password_hash: row.password_hash,
            roles: row.roles.into_iter().collect(),
            disabled: row.disabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct InsertedUser {
    id: Uuid,
    username: String,
    display_name: Option<String>,
    password_hash: String,
    disabled: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Credential store over PostgreSQL. Uniqueness is the `users.normalized_username` index.
#[derive(Clone)]
pub struct PgCredentialStore {
    pool: DbPool,
}

impl PgCredentialStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn create_user(&self, user: NewUser) -> StoreResult<UserRecord> {
        let roles: Vec<String> = user.roles.iter().cloned().collect();
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, InsertedUser>(
            r#"
            INSERT INTO users (username, normalized_username, display_name, password_hash)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (normalized_username) DO NOTHING
            RETURNING id, username, display_name, password_hash, disabled, created_at, updated_at
            "#,
        )
        .bind(user.username.trim())
        .bind(normalize_username(&user.username))
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back.
        let inserted = inserted.ok_or(StoreError::DuplicateUsername)?;

        if !roles.is_empty() {
            sqlx::query("INSERT INTO roles (name) SELECT UNNEST($1::text[]) ON CONFLICT DO NOTHING")
                .bind(&roles)
                .execute(&mut *tx)
                .await?;
            sqlx::query("INSERT INTO user_roles (user_id, role) SELECT $1, UNNEST($2::text[])")
                .bind(inserted.id)
                .bind(&roles)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        debug!(user_id = %inserted.id, "user created");

        Ok(UserRecord {
            id: inserted.id,
            username: inserted.username,
            display_name: inserted.display_name,
            password_hash: inserted.password_hash,
            roles: user.roles,
            disabled: inserted.disabled,
            created_at: inserted.created_at,
            updated_at: inserted.updated_at,
        })
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<UserRecord> {
        let query = format!("{} WHERE u.normalized_username = $1 GROUP BY u.id", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(normalize_username(username))
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::from).ok_or(StoreError::NotFound)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<UserRecord> {
        let query = format!("{} WHERE u.id = $1 GROUP BY u.id", SELECT_USER);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(UserRecord::from).ok_or(StoreError::NotFound)
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        let r = sqlx::query("UPDATE users SET password_hash = $1, updated_at = NOW() WHERE id = $2")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if r.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn set_disabled(&self, id: Uuid, disabled: bool) -> StoreResult<()> {
        let r = sqlx::query("UPDATE users SET disabled = $1, updated_at = NOW() WHERE id = $2")
            .bind(disabled)
            .bind(id)
            .execute(&self.pool)
            .await?;
        if r.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
