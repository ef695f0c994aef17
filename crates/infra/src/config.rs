//! Runtime configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - HMAC key for session and reset tokens (min 16 bytes, no default)
//!
//! ## Optional
//! - `BIND_ADDR` - Listen address (default: 0.0.0.0:8080)
//! - `DATABASE_URL` - `PostgreSQL` connection string; in-memory stores when unset
//! - `DATABASE_MAX_CONNECTIONS` - Pool size (default: 10)
//! - `CORS_ORIGIN` - Allowed browser origin (default: http://localhost:5173)
//! - `RESET_LINK_BASE` - Prefix for reset links (default: http://localhost:5173/reset-password)
//! - `SMTP_HOST` - Enables SMTP delivery of reset notices; log-only when unset
//! - `SMTP_PORT` - SMTP port (default: 587)
//! - `SMTP_USERNAME`, `SMTP_PASSWORD` - SMTP credentials (both or neither)
//! - `MAIL_FROM` - Sender address, required when `SMTP_HOST` is set

use std::net::SocketAddr;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use sweetshop_auth::token::MIN_SECRET_LEN;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_CORS_ORIGIN: &str = "http://localhost:5173";
const DEFAULT_RESET_LINK_BASE: &str = "http://localhost:5173/reset-password";
const DEFAULT_SMTP_PORT: u16 = 587;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: SecretString,
    pub database: Option<DatabaseConfig>,
    pub cors_origin: String,
    pub reset_link_base: String,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Contains the password.
    pub url: SecretString,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub credentials: Option<(String, SecretString)>,
    pub from_address: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt_secret = get("JWT_SECRET").ok_or_else(|| ConfigError::MissingEnvVar("JWT_SECRET".into()))?;
        if jwt_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InsecureSecret(
                "JWT_SECRET".into(),
                format!("must be at least {MIN_SECRET_LEN} bytes"),
            ));
        }

        let bind_addr = parse_var("BIND_ADDR", get("BIND_ADDR"), DEFAULT_BIND_ADDR.parse().ok())?;

        let database = match get("DATABASE_URL") {
            Some(url) => Some(DatabaseConfig {
                url: SecretString::from(url),
                max_connections: parse_var(
                    "DATABASE_MAX_CONNECTIONS",
                    get("DATABASE_MAX_CONNECTIONS"),
                    Some(DEFAULT_MAX_CONNECTIONS),
                )?,
            }),
            None => None,
        };

        let smtp = match get("SMTP_HOST") {
            Some(host) => {
                let credentials = match (get("SMTP_USERNAME"), get("SMTP_PASSWORD")) {
                    (Some(user), Some(password)) => Some((user, SecretString::from(password))),
                    (None, None) => None,
                    _ => {
                        return Err(ConfigError::InvalidEnvVar(
                            "SMTP_USERNAME".into(),
                            "SMTP_USERNAME and SMTP_PASSWORD must be set together".into(),
                        ));
                    }
                };
                Some(SmtpConfig {
                    host,
                    port: parse_var("SMTP_PORT", get("SMTP_PORT"), Some(DEFAULT_SMTP_PORT))?,
                    credentials,
                    from_address: get("MAIL_FROM").ok_or_else(|| ConfigError::MissingEnvVar("MAIL_FROM".into()))?,
                })
            }
            None => None,
        };

        Ok(Self {
            bind_addr,
            jwt_secret: SecretString::from(jwt_secret),
            database,
            cors_origin: get("CORS_ORIGIN").unwrap_or_else(|| DEFAULT_CORS_ORIGIN.to_string()),
            reset_link_base: get("RESET_LINK_BASE").unwrap_or_else(|| DEFAULT_RESET_LINK_BASE.to_string()),
            smtp,
        })
    }

    pub fn jwt_secret_bytes(&self) -> &[u8] {
        self.jwt_secret.expose_secret().as_bytes()
    }
}

fn parse_var<T>(key: &str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string())),
        None => default.ok_or_else(|| ConfigError::MissingEnvVar(key.to_string())),
    }
}
