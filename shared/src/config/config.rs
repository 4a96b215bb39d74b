use std::fs;
use tracing::{debug, error, info};

use crate::types::server_config::{AppConfig, ConfigError, MAX_TOKEN_EXPIRY_MINUTES};

pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    info!("Loading configuration from: {}", path);

    let contents = fs::read_to_string(path)?;
    debug!("Processing file: {}", path);

    if contents.trim().is_empty() {
        error!("Configuration file is empty");
        return Err(ConfigError::InvalidConfig("empty file".into()));
    }

    parse_config(&contents)
}

/// Parse and validate a TOML document. Split out of [`load_config`] so the
/// validation rules can be exercised without touching the filesystem.
pub fn parse_config(contents: &str) -> Result<AppConfig, ConfigError> {
    let config: AppConfig = toml::from_str(contents)?;

    info!("Configuration loaded successfully");

    validate_config(&config)?;

    info!("Config validated");

    Ok(config)
}

fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.paths.web_dir.is_empty() {
        return Err(ConfigError::InvalidConfig("web_dir cannot be empty".into()));
    }

    if config.auth.token_expiry_minutes == 0 {
        return Err(ConfigError::InvalidConfig(
            "token_expiry_minutes must be greater than 0".into(),
        ));
    }

    if config.auth.token_expiry_minutes > MAX_TOKEN_EXPIRY_MINUTES {
        return Err(ConfigError::InvalidConfig(format!(
            "token_expiry_minutes must be at most {}",
            MAX_TOKEN_EXPIRY_MINUTES
        )));
    }

    if config.server.max_connections == 0 {
        return Err(ConfigError::InvalidConfig(
            "max_connections must be greater than 0".into(),
        ));
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::InvalidConfig(
            "request_timeout_secs must be greater than 0".into(),
        ));
    }

    // No fallback secret: a missing or short key is rejected here rather
    // than silently signing sessions with a well-known value.
    match config.auth.resolved_jwt_secret() {
        None => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be set via the JWT_SECRET env var or auth.jwt_secret config field"
                    .into(),
            ));
        }
        Some(secret) if secret.len() < 32 => {
            return Err(ConfigError::InvalidConfig(
                "jwt_secret must be at least 32 characters long".into(),
            ));
        }
        _ => {}
    }

    if config.auth.resolved_admin_usernames().is_empty() {
        return Err(ConfigError::InvalidConfig(
            "at least one admin identity must be set via ADMIN_USERNAME or auth.admin_usernames"
                .into(),
        ));
    }

    let gate = &config.gate;
    for (name, value) in [
        ("protected_prefix", &gate.protected_prefix),
        ("login_path", &gate.login_path),
        ("unauthorized_path", &gate.unauthorized_path),
    ] {
        if !value.starts_with('/') {
            return Err(ConfigError::InvalidConfig(format!(
                "gate.{} must start with '/'",
                name
            )));
        }
    }

    // A redirect target inside the protected namespace would loop forever.
    for target in [&gate.login_path, &gate.unauthorized_path] {
        if target.starts_with(gate.protected_prefix.as_str()) {
            return Err(ConfigError::InvalidConfig(format!(
                "redirect target {} lies under the protected prefix {}",
                target, gate.protected_prefix
            )));
        }
    }

    if gate.cookie_name.is_empty()
        || gate
            .cookie_name
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, ';' | '=' | ','))
    {
        return Err(ConfigError::InvalidConfig(
            "gate.cookie_name must be a non-empty cookie token".into(),
        ));
    }

    Ok(())
}
