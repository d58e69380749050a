//! Request interceptors for protected routes: authenticate, then authorize.

use axum::{extract::Request, extract::State, middleware::Next, response::Response};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AppError;
use crate::handlers::http::AppState;

pub const ADMIN_ROLE: &str = "admin";

/// Authenticated caller, placed in request extensions by `authenticate`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub claims: Claims,
}

impl AuthUser {
    pub fn has_role(&self, role: &str) -> bool {
        self.claims.has_role(role)
    }
}

#[axum::async_trait]
impl<S> axum::extract::FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

/// First interceptor: require a valid `Authorization: Bearer` token.
/// Every failure is a plain 401; the reason only goes to the log.
pub async fn authenticate(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(TypedHeader(Authorization(bearer))) = bearer else {
        info!(path = %request.uri().path(), reason = "missing_token", "rejected request");
        return Err(AppError::Unauthorized);
    };

    let now = state.clock().now();
    let claims = state
        .token_validator()
        .validate(bearer.token(), now)
        .map_err(|e| {
            info!(path = %request.uri().path(), reason = e.as_str(), "rejected request");
            AppError::Unauthorized
        })?;
    let user_id = claims.user_id().map_err(|e| {
        info!(path = %request.uri().path(), reason = e.as_str(), "rejected request");
        AppError::Unauthorized
    })?;

    request.extensions_mut().insert(AuthUser { user_id, claims });
    Ok(next.run(request).await)
}

/// Second interceptor: caller must hold `role`. Runs after `authenticate`.
pub async fn require_role(role: &str, request: Request, next: Next) -> Result<Response, AppError> {
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(AppError::Unauthorized)?;
    if !user.has_role(role) {
        info!(user_id = %user.user_id, role, "missing role");
        return Err(AppError::Forbidden);
    }
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    require_role(ADMIN_ROLE, request, next).await
}
