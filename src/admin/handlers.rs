//! Admin HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::handlers::http::AppState;
use crate::middleware::auth::AuthUser;

#[derive(Debug, Deserialize)]
pub struct SetDisabledRequest {
    pub disabled: bool,
}

/// PATCH /admin/users/:id
pub async fn set_user_disabled(
    State(state): State<AppState>,
    admin: AuthUser,
    Path(id): Path<Uuid>,
    Json(body): Json<SetDisabledRequest>,
) -> Result<StatusCode, AppError> {
    if id == admin.user_id && body.disabled {
        return Err(AppError::Validation("cannot disable your own account".to_string()));
    }
    state.auth_service().set_disabled(id, body.disabled).await?;
    Ok(StatusCode::NO_CONTENT)
}
