//! Authentication: passwords, tokens, and the register/login flows.

pub mod clock;
mod handlers;
pub mod jwt;
pub mod password;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use handlers::{change_password, login, me, register};
pub use jwt::{Claims, IssuedToken, SigningKeys, TokenError, TokenIssuer, TokenValidator};
pub use password::PasswordService;
pub use service::{validate_username, AuthService};
