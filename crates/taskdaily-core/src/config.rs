//! Engine configuration.
//!
//! Configuration can be loaded from:
//! - a TOML file (default: `~/.config/taskdaily/config.toml`)
//! - environment variables (`TASKDAILY_*` prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use taskdaily_core::config::EngineConfig;
//!
//! // Load from default path or fall back to env vars
//! let config = EngineConfig::load().expect("Failed to load config");
//!
//! // Or from environment variables only
//! let config = EngineConfig::from_env();
//! assert!(config.autosave.debounce_ms > 0);
//! ```
//!
//! ```toml
//! [autosave]
//! debounce_ms = 1500
//! enabled = true
//!
//! [tags]
//! max_name_len = 64
//! ```

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::defaults;

static ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env placeholder regex")
});

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Debounced autosave settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosaveConfig {
    /// Inactivity window before an edit is committed.
    pub debounce_ms: u64,
    /// When false, edits are committed immediately without debouncing.
    pub enabled: bool,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            debounce_ms: defaults::AUTOSAVE_DEBOUNCE_MS,
            enabled: true,
        }
    }
}

impl AutosaveConfig {
    /// Create config from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `TASKDAILY_AUTOSAVE_DEBOUNCE_MS` | `1000` | Inactivity window before commit |
    /// | `TASKDAILY_AUTOSAVE_ENABLED` | `true` | Disable to commit every edit immediately |
    pub fn from_env() -> Self {
        let debounce_ms = env::var("TASKDAILY_AUTOSAVE_DEBOUNCE_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::AUTOSAVE_DEBOUNCE_MS);

        let enabled = env::var("TASKDAILY_AUTOSAVE_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        Self {
            debounce_ms,
            enabled,
        }
    }

    /// Set the debounce window.
    pub fn with_debounce_ms(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Enable or disable debouncing.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// The effective delay before a commit.
    pub fn delay(&self) -> Duration {
        if self.enabled {
            Duration::from_millis(self.debounce_ms)
        } else {
            Duration::ZERO
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::Validation(
                "autosave debounce_ms must be greater than zero".to_string(),
            ));
        }
        if self.debounce_ms > defaults::AUTOSAVE_DEBOUNCE_MAX_MS {
            return Err(ConfigError::Validation(format!(
                "autosave debounce_ms must be at most {}, got: {}",
                defaults::AUTOSAVE_DEBOUNCE_MAX_MS,
                self.debounce_ms
            )));
        }
        Ok(())
    }
}

/// Tag naming rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagConfig {
    /// Maximum characters accepted for an explicitly created tag.
    pub max_name_len: usize,
}

impl Default for TagConfig {
    fn default() -> Self {
        Self {
            max_name_len: defaults::TAG_NAME_MAX_LEN,
        }
    }
}

impl TagConfig {
    pub fn from_env() -> Self {
        let max_name_len = env::var("TASKDAILY_TAG_NAME_MAX_LEN")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(defaults::TAG_NAME_MAX_LEN);

        Self { max_name_len }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_name_len == 0 || self.max_name_len > defaults::TAG_NAME_MAX_LEN_LIMIT {
            return Err(ConfigError::Validation(format!(
                "tags max_name_len must be between 1 and {}, got: {}",
                defaults::TAG_NAME_MAX_LEN_LIMIT,
                self.max_name_len
            )));
        }
        Ok(())
    }
}

/// Top-level configuration for the hashtag engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub autosave: AutosaveConfig,
    pub tags: TagConfig,
}

impl EngineConfig {
    /// Get the default configuration file path.
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("taskdaily");
        path.push("config.toml");
        path
    }

    /// Load configuration from the default path, falling back to environment variables.
    ///
    /// `TASKDAILY_CONFIG` overrides the default path.
    pub fn load() -> ConfigResult<Self> {
        let path = env::var("TASKDAILY_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_config_path());

        if path.exists() {
            info!("Loading engine config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text, substituting `${VAR}` placeholders.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let content = substitute_env_vars(content);
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            autosave: AutosaveConfig::from_env(),
            tags: TagConfig::from_env(),
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        self.autosave.validate()?;
        self.tags.validate()?;
        Ok(())
    }
}

/// Replace `${VAR}` with the variable's value; unknown variables are left as-is.
fn substitute_env_vars(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}
