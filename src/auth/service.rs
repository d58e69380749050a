//! Auth application service: register, login, password change, account disable.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use super::jwt::{IssuedToken, TokenIssuer};
use super::password::{check_password_policy, PasswordService};
use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UserRecord};
use crate::store::{CredentialStore, StoreError};

const USERNAME_EXTRA_CHARS: &str = "-._@+";

#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    passwords: PasswordService,
    issuer: TokenIssuer,
    default_role: String,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        passwords: PasswordService,
        issuer: TokenIssuer,
        default_role: String,
    ) -> Self {
        Self {
            store,
            passwords,
            issuer,
            default_role,
        }
    }

    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// Create an account with the default role.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        display_name: Option<String>,
    ) -> AppResult<UserRecord> {
        validate_username(username)?;
        check_password_policy(password)?;

        let password_hash = self.hash(password).await?;
        let mut user = NewUser::new(username.trim(), password_hash).with_role(&self.default_role);
        user.display_name = display_name.filter(|n| !n.trim().is_empty());

        let user = self.store.create_user(user).await.map_err(|e| {
            if matches!(e, StoreError::DuplicateUsername) {
                info!(username = %username.trim(), "registration rejected: username taken");
            }
            AppError::from(e)
        })?;
        info!(user_id = %user.id, "user registered");
        Ok(user)
    }

    /// Check credentials and mint a token. Every failure is `InvalidCredentials`;
    /// the log line carries the actual reason.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> AppResult<(UserRecord, IssuedToken)> {
        let user = match self.store.find_by_username(username).await {
            Ok(user) => Some(user),
            Err(StoreError::NotFound) => None,
            Err(e) => return Err(e.into()),
        };

        let Some(user) = user else {
            self.verify_missing(password).await?;
            info!(username = %username, reason = "unknown_user", "login rejected");
            return Err(AppError::InvalidCredentials);
        };

        if !self.verify(password, &user.password_hash).await? {
            warn!(user_id = %user.id, reason = "bad_password", "login rejected");
            return Err(AppError::InvalidCredentials);
        }
        if user.disabled {
            warn!(user_id = %user.id, reason = "disabled", "login rejected");
            return Err(AppError::InvalidCredentials);
        }

        let roles = user.roles.iter().cloned().collect();
        let token = self.issuer.issue(user.id, &user.username, roles, now)?;
        info!(user_id = %user.id, expires_at = %token.expires_at, "login succeeded");
        Ok((user, token))
    }

    pub async fn change_password(
        &self,
        user_id: Uuid,
        current_password: &str,
        new_password: &str,
    ) -> AppResult<()> {
        let user = self.store.find_by_id(user_id).await?;
        if !self.verify(current_password, &user.password_hash).await? {
            warn!(user_id = %user_id, reason = "bad_password", "password change rejected");
            return Err(AppError::InvalidCredentials);
        }
        if user.disabled {
            warn!(user_id = %user_id, reason = "disabled", "password change rejected");
            return Err(AppError::InvalidCredentials);
        }
        check_password_policy(new_password)?;

        let hash = self.hash(new_password).await?;
        self.store.update_password(user_id, &hash).await?;
        info!(user_id = %user_id, "password changed");
        Ok(())
    }

    pub async fn set_disabled(&self, user_id: Uuid, disabled: bool) -> AppResult<()> {
        self.store.set_disabled(user_id, disabled).await?;
        info!(user_id = %user_id, disabled, "account status changed");
        Ok(())
    }

    // Argon2 is CPU bound; keep it off the async workers.

    async fn hash(&self, password: &str) -> AppResult<String> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || passwords.hash(&password)).await?
    }

    async fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        let hash = hash.to_owned();
        Ok(tokio::task::spawn_blocking(move || passwords.verify(&password, &hash)).await?)
    }

    async fn verify_missing(&self, password: &str) -> AppResult<bool> {
        let passwords = self.passwords.clone();
        let password = password.to_owned();
        Ok(tokio::task::spawn_blocking(move || passwords.verify_dummy(&password)).await?)
    }
}

/// Letters, digits and `-._@+`; no surrounding whitespace once trimmed.
pub fn validate_username(username: &str) -> AppResult<()> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username is required".to_string()));
    }
    if !username
        .chars()
        .all(|c| c.is_alphanumeric() || USERNAME_EXTRA_CHARS.contains(c))
    {
        return Err(AppError::Validation(format!(
            "username may only contain letters, digits and {}",
            USERNAME_EXTRA_CHARS
        )));
    }
    Ok(())
}
