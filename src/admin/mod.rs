//! Admin API: account management behind the `admin` role.

mod handlers;

pub use handlers::*;
