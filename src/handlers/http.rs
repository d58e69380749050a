//! Shared application state and the health endpoint.

use axum::{http::StatusCode, Json};
use serde_json::json;
use std::sync::Arc;

use crate::auth::{AuthService, Clock, PasswordService, SigningKeys, TokenIssuer, TokenValidator};
use crate::config::{Config, ConfigError};
use crate::store::CredentialStore;

/// Shared application state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub auth_service: AuthService,
    pub token_validator: TokenValidator,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    /// Build state from configuration. Key or hashing misconfiguration fails here, before serving.
    pub fn new(
        config: &Config,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let keys = Arc::new(SigningKeys::from_config(&config.jwt)?);
        let passwords = PasswordService::new(&config.password)?;
        let issuer = TokenIssuer::new(keys.clone(), &config.jwt);
        let auth_service = AuthService::new(store, passwords, issuer, config.default_role.clone());
        Ok(Self {
            auth_service,
            token_validator: TokenValidator::new(keys, &config.jwt),
            clock,
        })
    }

    pub fn auth_service(&self) -> &AuthService {
        &self.auth_service
    }
    pub fn token_validator(&self) -> &TokenValidator {
        &self.token_validator
    }
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}

/// GET /health — liveness probe.
pub async fn health() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "service": "gatekeep" })),
    )
}
