//! HTTP handlers for register, login, profile and password change.

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::auth::AuthUser;
use crate::models::UserProfile;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 64))]
    pub username: String,
    #[validate(length(max = 256))]
    pub password: String,
    #[validate(length(max = 128))]
    pub display_name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(max = 64))]
    pub username: String,
    #[validate(length(max = 256))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
    pub expires_at: String,
    pub user: UserProfile,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ChangePasswordRequest {
    #[validate(length(max = 256))]
    pub current_password: String,
    #[validate(length(max = 256))]
    pub new_password: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    body.validate()?;
    let user = state
        .auth_service()
        .register(&body.username, &body.password, body.display_name)
        .await?;
    Ok((StatusCode::CREATED, Json(UserProfile::from(&user))))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // Oversized input gets the same answer as any other failed login.
    if body.validate().is_err() {
        return Err(AppError::InvalidCredentials);
    }
    let now = state.clock().now();
    let (user, issued) = state
        .auth_service()
        .login(&body.username, &body.password, now)
        .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        token_type: "Bearer",
        expires_in: issued.expires_in,
        expires_at: issued.expires_at.to_rfc3339(),
        user: UserProfile::from(&user),
    }))
}

/// GET /auth/me
pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let record = state.auth_service().store().find_by_id(user.user_id).await?;
    Ok(Json(UserProfile::from(&record)))
}

/// POST /auth/password
pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    body.validate()?;
    state
        .auth_service()
        .change_password(user.user_id, &body.current_password, &body.new_password)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
