use serde::Deserialize;
use std::collections::BTreeSet;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

// ---------------------------------------------------------------------------
// Config structs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PathsConfig {
    pub web_dir: String,
    /// sqlx connection string, e.g. `sqlite://soundfront.db`.
    ///
    /// `DATABASE_URL` takes priority when set.
    #[serde(default = "default_database_url")]
    pub database_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    #[serde(default = "default_token_expiry")]
    pub token_expiry_minutes: u64,

    /// HMAC key used to sign and verify session tokens.
    ///
    /// Prefer loading this via the `JWT_SECRET` environment variable.
    /// There is no built-in fallback: startup fails when neither source is
    /// set, and rotating it invalidates every issued session.
    ///
    /// **Minimum length:** 32 characters.
    pub jwt_secret: Option<String>,

    /// Identities allowed through the admin gate. `ADMIN_USERNAME`
    /// (comma-separated) replaces this list when set.
    #[serde(default)]
    pub admin_usernames: Vec<String>,

    /// Argon2 PHC string checked by `/api/login`. Login is disabled when
    /// neither this nor `ADMIN_PASSWORD_HASH` is set.
    pub admin_password_hash: Option<String>,

    /// Force the `Secure` attribute on the session cookie even when the
    /// request does not look like HTTPS.
    #[serde(default)]
    pub secure_cookies: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GateConfig {
    #[serde(default = "default_protected_prefix")]
    pub protected_prefix: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_unauthorized_path")]
    pub unauthorized_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub gate: GateConfig,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

impl ServerConfig {
    /// Full bind address, e.g. `"127.0.0.1:3000"`
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: default_port(),
            max_connections: default_max_connections(),
            request_timeout_secs: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            protected_prefix: default_protected_prefix(),
            cookie_name: default_cookie_name(),
            login_path: default_login_path(),
            unauthorized_path: default_unauthorized_path(),
        }
    }
}

impl PathsConfig {
    pub fn resolved_database_url(&self) -> String {
        non_empty_env("DATABASE_URL").unwrap_or_else(|| self.database_url.clone())
    }
}

impl AuthConfig {
    /// Token expiry converted to seconds — used for the JWT `exp` and the
    /// cookie `Max-Age`.
    pub fn token_expiry_secs(&self) -> u64 {
        self.token_expiry_minutes.saturating_mul(60)
    }

    /// Resolve the JWT secret with `JWT_SECRET` env-var taking priority over
    /// the config file field.
    ///
    /// Returns `None` when neither source is set (treated as a hard error
    /// by `validate_config`).
    pub fn resolved_jwt_secret(&self) -> Option<String> {
        non_empty_env("JWT_SECRET").or_else(|| self.jwt_secret.clone().filter(|s| !s.is_empty()))
    }

    /// Admin identities, `ADMIN_USERNAME` first. Blank entries are dropped.
    pub fn resolved_admin_usernames(&self) -> BTreeSet<String> {
        match non_empty_env("ADMIN_USERNAME") {
            Some(list) => parse_identity_list(&list),
            None => self
                .admin_usernames
                .iter()
                .map(|u| u.trim())
                .filter(|u| !u.is_empty())
                .map(str::to_string)
                .collect(),
        }
    }

    pub fn resolved_admin_password_hash(&self) -> Option<String> {
        non_empty_env("ADMIN_PASSWORD_HASH")
            .or_else(|| self.admin_password_hash.clone().filter(|s| !s.is_empty()))
    }
}

/// Split a comma-separated identity list, trimming and dropping blanks.
pub fn parse_identity_list(list: &str) -> BTreeSet<String> {
    list.split(',')
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .map(str::to_string)
        .collect()
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

// ---------------------------------------------------------------------------
// Serde defaults
// ---------------------------------------------------------------------------

pub fn default_bind() -> String {
    "127.0.0.1".to_string()
}

pub fn default_port() -> u16 {
    3000
}

pub fn default_max_connections() -> usize {
    1000
}

pub fn default_request_timeout() -> u64 {
    30
}

pub fn default_max_body_bytes() -> usize {
    1024 * 1024
}

pub fn default_database_url() -> String {
    "sqlite://soundfront.db".to_string()
}

/// Upper bound on session lifetime: one year.
pub const MAX_TOKEN_EXPIRY_MINUTES: u64 = 60 * 24 * 365;

pub fn default_token_expiry() -> u64 {
    60 * 24
}

pub fn default_protected_prefix() -> String {
    "/admin".to_string()
}

pub fn default_cookie_name() -> String {
    "token".to_string()
}

pub fn default_login_path() -> String {
    "/login".to_string()
}

pub fn default_unauthorized_path() -> String {
    "/unauthorized".to_string()
}
