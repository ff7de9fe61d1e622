//! Global configuration loader for CodeFuse.
//!
//! Reads `config.toml` from the data directory (`~/.codefuse/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to sensible defaults
//! when the file is missing or malformed.

use std::path::{Path, PathBuf};

use codefuse_types::config::{ContextConfig, GlobalConfig};
use codefuse_types::error::ConfigError;

use crate::sqlite::pool::default_database_url;

/// Resolve the data directory: `CODEFUSE_DATA_DIR` if set, else `~/.codefuse`.
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("CODEFUSE_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".codefuse")
}

/// Parse and validate a config document.
pub fn parse_global_config(content: &str) -> Result<GlobalConfig, ConfigError> {
    let config: GlobalConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    config.context.validate()?;
    Ok(config)
}

/// Read `{data_dir}/config.toml`.
///
/// A missing file is not an error and yields `Ok(None)`; any other I/O
/// failure is [`ConfigError::Read`].
pub async fn read_global_config(data_dir: &Path) -> Result<Option<GlobalConfig>, ConfigError> {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(err.into()),
    };

    parse_global_config(&content).map(Some)
}

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file cannot be read, parsed or validated, logs a warning and returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    match read_global_config(data_dir).await {
        Ok(Some(config)) => config,
        Ok(None) => {
            tracing::debug!("No config.toml found in {}, using defaults", data_dir.display());
            GlobalConfig::default()
        }
        Err(err) => {
            tracing::warn!("Ignoring config.toml in {}: {err}, using defaults", data_dir.display());
            GlobalConfig::default()
        }
    }
}

/// Database URL to connect to: the configured override or the data-dir default.
pub fn resolve_database_url(config: &GlobalConfig, data_dir: &Path) -> String {
    config
        .database_url
        .clone()
        .unwrap_or_else(|| default_database_url(data_dir))
}

/// Context limits with command-line overrides applied on top of the file.
pub fn resolve_context_config(
    config: &GlobalConfig,
    window_size: Option<usize>,
    max_context_chars: Option<usize>,
) -> Result<ContextConfig, ConfigError> {
    let resolved = ContextConfig {
        window_size: window_size.unwrap_or(config.context.window_size),
        max_context_chars: max_context_chars.unwrap_or(config.context.max_context_chars),
    };
    resolved.validate()?;
    Ok(resolved)
}
