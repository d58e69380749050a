//! Identity and bearer-token authentication core for HTTP APIs.
//!
//! User accounts live behind a [`store::CredentialStore`]; passwords are
//! Argon2id hashes; logins mint signed JWTs that protected routes check
//! through an explicit interceptor chain (authenticate, then authorize).

pub mod admin;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use handlers::http::AppState;

use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, patch, post};
use handlers::http;
use tower_http::trace::TraceLayer;

/// Build the API router. Used by main and by integration tests.
///
/// Protected routes run `authenticate`, then (admin only) `require_admin`,
/// then the handler. `route_layer` wraps only the routes declared before it,
/// and the last layer added runs first.
pub fn create_app(state: AppState) -> axum::Router {
    let auth_routes = axum::Router::new()
        .route("/me", get(auth::me))
        .route("/password", post(auth::change_password))
        .route_layer(from_fn_with_state(state.clone(), middleware::authenticate))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let admin_routes = axum::Router::new()
        .route("/users/:id", patch(admin::set_user_disabled))
        .route_layer(from_fn(middleware::require_admin))
        .route_layer(from_fn_with_state(state.clone(), middleware::authenticate));

    axum::Router::new()
        .route("/health", get(http::health))
        .nest("/auth", auth_routes)
        .nest("/admin", admin_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
