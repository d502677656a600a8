use std::path::{Path, PathBuf};

use crate::config::schema::ClientConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/client-config-v1.json");

/// Overrides `server.base_url` when set.
pub const BASE_URL_ENV: &str = "CONVTRACK_BASE_URL";

const MAX_PAGE_LIMIT: u32 = 1000;

/// Default location: `<config dir>/convtrack/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("convtrack").join("config.json"))
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ClientConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ClientConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let mut config: ClientConfig = serde_json::from_value(json_value)?;

    apply_env_overrides(&mut config);
    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn apply_env_overrides(config: &mut ClientConfig) {
    if let Ok(url) = std::env::var(BASE_URL_ENV) {
        if !url.trim().is_empty() {
            log::debug!("Server URL overridden by {}", BASE_URL_ENV);
            config.server.base_url = url.trim().to_string();
        }
    }
}

/// Semantic checks that the schema cannot express.
pub fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    let url = reqwest::Url::parse(&config.server.base_url).map_err(|e| ConfigError::InvalidUrl {
        url: config.server.base_url.clone(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            url: config.server.base_url.clone(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }

    if config.polling.interval_ms == 0 {
        return Err(ConfigError::Validation {
            message: "polling.interval_ms must be greater than zero".to_string(),
        });
    }

    if config.polling.page_limit == 0 || config.polling.page_limit > MAX_PAGE_LIMIT {
        return Err(ConfigError::Validation {
            message: format!(
                "polling.page_limit must be between 1 and {}, got {}",
                MAX_PAGE_LIMIT, config.polling.page_limit
            ),
        });
    }

    if config.server.request_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "server.request_timeout_secs must be greater than zero".to_string(),
        });
    }

    Ok(())
}
