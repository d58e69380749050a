//! Application configuration loaded from environment.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use chrono::Duration;
use jsonwebtoken::Algorithm;
use std::net::SocketAddr;
use std::str::FromStr;

/// Shortest accepted shared secret for HMAC algorithms, in bytes.
pub const MIN_SECRET_LEN: usize = 32;
const EPHEMERAL_SECRET_LEN: usize = 48;
const MAX_TTL_MINUTES: i64 = 24 * 60;

/// Application configuration loaded from `.env` and environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g. `0.0.0.0:3000`).
    pub server_addr: SocketAddr,
    pub environment: Environment,
    /// Log level: `error`, `warn`, `info`, `debug`, `trace`.
    pub log_level: String,
    pub store: StoreKind,
    /// PostgreSQL connection URL. Required when `store` is `postgres`.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub password: PasswordConfig,
    /// Role granted to every self-registered account.
    pub default_role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Production,
    Development,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    Memory,
}

/// Token signing settings.
#[derive(Clone)]
pub struct JwtConfig {
    pub algorithm: Algorithm,
    pub key: KeyMaterial,
    pub issuer: String,
    pub audience: String,
    pub ttl: Duration,
    /// Set when the secret was generated at startup (development only).
    pub ephemeral_secret: bool,
}

// Key bytes stay out of Debug output.
impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("algorithm", &self.algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("ttl_minutes", &self.ttl.num_minutes())
            .field("ephemeral_secret", &self.ephemeral_secret)
            .finish_non_exhaustive()
    }
}

/// Raw signing key material. Parsed into `jsonwebtoken` keys by `SigningKeys::from_config`.
#[derive(Clone)]
pub enum KeyMaterial {
    /// Shared secret for HS256/HS384/HS512.
    Secret(Vec<u8>),
    /// PEM-encoded key pair for RSA, ECDSA and EdDSA algorithms.
    Pem { private: Vec<u8>, public: Vec<u8> },
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
        }
    }
}

impl Config {
    /// Load configuration from environment. Call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let server_addr = get("SERVER_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let server_addr: SocketAddr = server_addr
            .parse()
            .map_err(|_| ConfigError::invalid("SERVER_ADDR", "expected host:port"))?;

        let environment = match get("APP_ENV").as_deref() {
            None | Some("production") => Environment::Production,
            Some("development") => Environment::Development,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "APP_ENV",
                    format!("unknown environment `{}`", other),
                ))
            }
        };

        let log_level = get("LOG_LEVEL").unwrap_or_else(|| "info".to_string());

        let store = match get("CREDENTIAL_STORE").as_deref() {
            None | Some("postgres") => StoreKind::Postgres,
            Some("memory") => StoreKind::Memory,
            Some(other) => {
                return Err(ConfigError::invalid(
                    "CREDENTIAL_STORE",
                    format!("unknown store `{}`", other),
                ))
            }
        };
        let database_url = get("DATABASE_URL");
        if store == StoreKind::Postgres && database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), 10)?;

        let jwt = load_jwt(&get, environment)?;

        let defaults = PasswordConfig::default();
        let password = PasswordConfig {
            memory_kib: parse_or("ARGON2_MEMORY_KIB", get("ARGON2_MEMORY_KIB"), defaults.memory_kib)?,
            iterations: parse_or("ARGON2_ITERATIONS", get("ARGON2_ITERATIONS"), defaults.iterations)?,
            parallelism: parse_or(
                "ARGON2_PARALLELISM",
                get("ARGON2_PARALLELISM"),
                defaults.parallelism,
            )?,
        };

        let default_role = get("DEFAULT_ROLE").unwrap_or_else(|| "user".to_string());

        Ok(Self {
            server_addr,
            environment,
            log_level,
            store,
            database_url,
            db_max_connections,
            jwt,
            password,
            default_role,
        })
    }
}

fn load_jwt<G>(get: &G, environment: Environment) -> Result<JwtConfig, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let algorithm = match get("JWT_ALGORITHM") {
        Some(name) => Algorithm::from_str(&name)
            .map_err(|_| ConfigError::invalid("JWT_ALGORITHM", format!("unsupported `{}`", name)))?,
        None if environment == Environment::Development => Algorithm::HS256,
        None => return Err(ConfigError::Missing("JWT_ALGORITHM")),
    };

    let mut ephemeral_secret = false;
    let key = if is_hmac(algorithm) {
        match get("JWT_SECRET") {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(ConfigError::invalid(
                    "JWT_SECRET",
                    format!("must be at least {} bytes", MIN_SECRET_LEN),
                ))
            }
            Some(secret) => KeyMaterial::Secret(secret.into_bytes()),
            None if environment == Environment::Development => {
                let mut secret = vec![0u8; EPHEMERAL_SECRET_LEN];
                OsRng.fill_bytes(&mut secret);
                ephemeral_secret = true;
                KeyMaterial::Secret(secret)
            }
            None => return Err(ConfigError::Missing("JWT_SECRET")),
        }
    } else {
        let private = read_pem(get, "JWT_PRIVATE_KEY_PATH")?;
        let public = read_pem(get, "JWT_PUBLIC_KEY_PATH")?;
        KeyMaterial::Pem { private, public }
    };

    let issuer = get("JWT_ISSUER").ok_or(ConfigError::Missing("JWT_ISSUER"))?;
    let audience = get("JWT_AUDIENCE").ok_or(ConfigError::Missing("JWT_AUDIENCE"))?;

    let ttl_minutes: i64 = parse_or("JWT_TTL_MINUTES", get("JWT_TTL_MINUTES"), 60)?;
    if !(1..=MAX_TTL_MINUTES).contains(&ttl_minutes) {
        return Err(ConfigError::invalid(
            "JWT_TTL_MINUTES",
            format!("must be between 1 and {}", MAX_TTL_MINUTES),
        ));
    }

    Ok(JwtConfig {
        algorithm,
        key,
        issuer,
        audience,
        ttl: Duration::minutes(ttl_minutes),
        ephemeral_secret,
    })
}

/// True for the shared-secret algorithm family.
pub fn is_hmac(algorithm: Algorithm) -> bool {
    matches!(algorithm, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

fn read_pem<G>(get: &G, name: &'static str) -> Result<Vec<u8>, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let path = get(name).ok_or(ConfigError::Missing(name))?;
    std::fs::read(&path).map_err(|e| ConfigError::invalid(name, format!("{}: {}", path, e)))
}

fn parse_or<T>(name: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
{
    match value {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(name, format!("cannot parse `{}`", v))),
        None => Ok(default),
    }
}

/// Startup configuration failure. Always fatal.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

impl ConfigError {
    pub fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            name,
            reason: reason.into(),
        }
    }
}
