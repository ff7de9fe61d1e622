//! Global configuration types for CodeFuse.
//!
//! `GlobalConfig` represents the top-level `config.toml` that controls the
//! database location and the context window limits.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of most recent messages considered for the context window.
pub const DEFAULT_WINDOW_SIZE: usize = 20;

/// Character budget of a rendered context (roughly 4 characters per token).
pub const DEFAULT_MAX_CONTEXT_CHARS: usize = 30_000;

/// Top-level configuration.
///
/// Loaded from `~/.codefuse/config.toml`. All fields have sensible defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Overrides the default `sqlite://{data_dir}/codefuse.db`.
    #[serde(default)]
    pub database_url: Option<String>,

    #[serde(default)]
    pub context: ContextConfig,
}

/// Limits applied when rendering a conversation's context window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextConfig {
    #[serde(default = "default_window_size")]
    pub window_size: usize,

    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

fn default_window_size() -> usize {
    DEFAULT_WINDOW_SIZE
}

fn default_max_context_chars() -> usize {
    DEFAULT_MAX_CONTEXT_CHARS
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_context_chars: DEFAULT_MAX_CONTEXT_CHARS,
        }
    }
}

impl ContextConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid(
                "context.window_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
