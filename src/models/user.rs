//! User identity records.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stored user identity. The password hash is a PHC string (algorithm, params, salt and digest).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: Uuid,
    pub username: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub roles: BTreeSet<String>,
    /// Soft-disable flag; disabled accounts cannot log in but are kept.
    pub disabled: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRecord {
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

/// Input for `CredentialStore::create_user`.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub display_name: Option<String>,
    pub password_hash: String,
    pub roles: BTreeSet<String>,
}

impl NewUser {
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            display_name: None,
            password_hash: password_hash.into(),
            roles: BTreeSet::new(),
        }
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.insert(role.into());
        self
    }
}

/// Public view of a user (no credential material).
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub display_name: Option<String>,
    pub roles: Vec<String>,
    pub disabled: bool,
    pub created_at: String,
}

impl From<&UserRecord> for UserProfile {
    fn from(user: &UserRecord) -> Self {
        Self {
            id: user.id.to_string(),
            username: user.username.clone(),
            display_name: user.display_name.clone(),
            roles: user.roles.iter().cloned().collect(),
            disabled: user.disabled,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Canonical form used for username uniqueness and lookup.
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize_username("  Alice "), "alice");
        assert_eq!(normalize_username("BOB"), "bob");
    }

    #[test]
    fn profile_omits_password_hash() {
        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            display_name: Some("Alice".to_string()),
            password_hash: "$argon2id$secret".to_string(),
            roles: ["user".to_string()].into_iter().collect(),
            disabled: false,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(UserProfile::from(&user)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["roles"], serde_json::json!(["user"]));
        assert!(json.get("password_hash").is_none());
    }
}
