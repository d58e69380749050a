//! Entry point: load config, wire dependencies, and run the server.

use gatekeep::auth::SystemClock;
use gatekeep::config::{Config, StoreKind};
use gatekeep::db::{self, PgCredentialStore};
use gatekeep::store::{CredentialStore, MemoryCredentialStore};
use gatekeep::{create_app, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env().map_err(|e| anyhow::anyhow!("config: {}", e))?;

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))?;
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    if config.jwt.ephemeral_secret {
        tracing::warn!("JWT_SECRET not set; using a random secret, tokens will not survive a restart");
    }

    let store: Arc<dyn CredentialStore> = match config.store {
        StoreKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("config: missing required setting DATABASE_URL"))?;
            let pool = db::create_pool(url, config.db_max_connections).await?;
            Arc::new(PgCredentialStore::new(pool))
        }
        StoreKind::Memory => {
            tracing::warn!("using in-memory credential store; accounts are lost on restart");
            Arc::new(MemoryCredentialStore::new())
        }
    };

    let state = AppState::new(&config, store, Arc::new(SystemClock))
        .map_err(|e| anyhow::anyhow!("config: {}", e))?;

    tracing::info!(
        algorithm = ?config.jwt.algorithm,
        kid = %state.token_validator().kid(),
        issuer = %config.jwt.issuer,
        audience = %config.jwt.audience,
        ttl_minutes = config.jwt.ttl.num_minutes(),
        "token keys loaded"
    );

    let app = create_app(state);

    tracing::info!(addr = %config.server_addr, "listening");
    let listener = tokio::net::TcpListener::bind(config.server_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
