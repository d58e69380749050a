//! Database layer: pool and the PostgreSQL credential store.

mod pool;
mod repositories;

pub use pool::{create_pool, DbPool};
pub use repositories::{PgCredentialStore, UserRow};
