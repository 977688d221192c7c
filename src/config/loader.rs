//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::ProxyConfig;
use crate::config::validation::ValidationError;

/// Environment variable overriding `listener.port`.
pub const ENV_PORT: &str = "PORT";

/// Environment variable overriding `origins.allowed` (comma-separated).
pub const ENV_ALLOWED_ORIGINS: &str = "ALLOWED_ORIGINS";

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid environment variable {name}: {value:?}")]
    Env { name: &'static str, value: String },

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

/// Parse configuration from TOML text. Missing sections take defaults.
pub fn parse_config(content: &str) -> Result<ProxyConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Load configuration from an optional TOML file, then apply process
/// environment overrides. The result is not validated yet.
pub fn load(path: Option<&Path>) -> Result<ProxyConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let config = parse_config(&content)?;
            tracing::debug!(path = %path.display(), "Configuration file read");
            config
        }
        None => ProxyConfig::default(),
    };

    apply_env(&mut config, |name| std::env::var(name).ok())?;
    Ok(config)
}

/// Apply environment overrides using `lookup` to resolve variables.
pub fn apply_env<F>(config: &mut ProxyConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(ENV_PORT) {
        config.listener.port = value.trim().parse().map_err(|_| ConfigError::Env {
            name: ENV_PORT,
            value: value.clone(),
        })?;
    }

    if let Some(value) = lookup(ENV_ALLOWED_ORIGINS) {
        config.origins.allowed = value
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
    }

    Ok(())
}
