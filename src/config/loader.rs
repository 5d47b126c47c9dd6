//! Configuration loading from disk and the process environment.

use std::fs;

use thiserror::Error;

use crate::config::schema::{ApiKey, RelayConfig};
use crate::config::validation::{validate_config, ValidationError};
use crate::http::cors::parse_origin_list;

/// Upstream credential.
pub const ENV_API_KEY: &str = "OPENAI_API_KEY";
/// Comma-separated origin allow-list.
pub const ENV_ALLOW_ORIGINS: &str = "ALLOW_ORIGINS";
/// Optional path to a TOML config file.
pub const ENV_CONFIG_PATH: &str = "RELAY_CONFIG";
/// Optional listener override.
pub const ENV_BIND_ADDRESS: &str = "RELAY_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build the startup configuration from the process environment.
///
/// Reads the optional file named by `RELAY_CONFIG`, then layers the
/// environment on top and validates the result.
pub fn load_from_env() -> Result<RelayConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Same as [`load_from_env`] with an injectable variable lookup.
pub fn load_with<F>(lookup: F) -> Result<RelayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = match lookup(ENV_CONFIG_PATH).filter(|p| !p.trim().is_empty()) {
        Some(path) => {
            let content = fs::read_to_string(path.trim())?;
            toml::from_str(&content)?
        }
        None => RelayConfig::default(),
    };

    apply_env(&mut config, &lookup);
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment values onto a configuration.
pub fn apply_env<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    config.api_key = lookup(ENV_API_KEY).and_then(ApiKey::new);

    if let Some(origins) = lookup(ENV_ALLOW_ORIGINS) {
        config.cors.allow_origins = parse_origin_list(&origins);
    }

    if let Some(addr) = lookup(ENV_BIND_ADDRESS).filter(|a| !a.trim().is_empty()) {
        config.listener.bind_address = addr.trim().to_string();
    }
}
