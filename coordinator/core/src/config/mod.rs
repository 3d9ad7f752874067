//! TOML Configuration File Support
//!
//! Configuration loading for the coordinator and the replay driver, backed by a
//! TOML file at `~/.config/uigen/uigen.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! - `$XDG_CONFIG_HOME/uigen/uigen.toml` (typically `~/.config/uigen/uigen.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [model]
//! name = "claude-haiku"
//! system_prompt_file = "/home/me/.config/uigen/prompt.md"
//!
//! [stream]
//! channel_capacity = 64
//! history_messages = 20
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Overrides |
//! |----------|-----------|
//! | `UIGEN_MODEL` | `model.name` |
//! | `UIGEN_SYSTEM_PROMPT_FILE` | `model.system_prompt_file` |
//! | `UIGEN_CHANNEL_CAPACITY` | `stream.channel_capacity` |
//! | `UIGEN_HISTORY_MESSAGES` | `stream.history_messages` |

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coordinator::CoordinatorConfig;

/// Model used when nothing else is configured
pub const DEFAULT_MODEL: &str = "claude-haiku";

/// Default capacity of the update channel between coordinator and surface
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Default number of prior messages sent as context
pub const DEFAULT_HISTORY_MESSAGES: usize = 20;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Model section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelToml {
    /// Model identifier passed to the transport
    pub name: Option<String>,

    /// File holding the system prompt
    pub system_prompt_file: Option<String>,
}

/// Stream section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamToml {
    /// Capacity of the update channel
    pub channel_capacity: Option<usize>,

    /// Prior messages sent as context (0 = all)
    pub history_messages: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UigenToml {
    /// Model configuration section
    pub model: ModelToml,

    /// Stream configuration section
    pub stream: StreamToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Resolved configuration
///
/// Consolidates all sources and remembers which one won last. Use
/// [`load_config`] to load configuration with proper priority handling.
#[derive(Clone, Debug)]
pub struct UigenConfigFile {
    /// Model identifier
    pub model: String,

    /// File holding the system prompt
    pub system_prompt_file: Option<PathBuf>,

    /// Capacity of the update channel
    pub channel_capacity: usize,

    /// Prior messages sent as context (0 = all)
    pub history_messages: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for UigenConfigFile {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            system_prompt_file: None,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            history_messages: DEFAULT_HISTORY_MESSAGES,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl UigenConfigFile {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Check values that would break the coordinator
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] for an empty model name or a
    /// zero channel capacity.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "model name must not be empty".to_string(),
            ));
        }
        if self.channel_capacity == 0 {
            return Err(ConfigError::ValidationError(
                "stream.channel_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Coordinator settings, with the system prompt text already read
    #[must_use]
    pub fn coordinator_config(&self, system_prompt: Option<String>) -> CoordinatorConfig {
        CoordinatorConfig {
            model: self.model.clone(),
            system_prompt,
            history_messages: self.history_messages,
        }
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/uigen/uigen.toml` or
/// `~/.config/uigen/uigen.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("uigen").join("uigen.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or if the
/// resulting values are invalid. A missing config file is not an error.
pub fn load_config() -> Result<UigenConfigFile, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Arguments
///
/// * `path` - Optional path to the configuration file. If `None`, only defaults
///   and environment variables are used.
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed, or
/// if the resulting values are invalid.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<UigenConfigFile, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<UigenConfigFile, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = UigenConfigFile::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: UigenToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config);
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    apply_env_config(&mut config, env);
    config.validate()?;

    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut UigenConfigFile, toml: &UigenToml) {
    if let Some(ref name) = toml.model.name {
        config.model.clone_from(name);
    }
    if let Some(ref file) = toml.model.system_prompt_file {
        config.system_prompt_file = Some(PathBuf::from(file));
    }

    if let Some(capacity) = toml.stream.channel_capacity {
        config.channel_capacity = capacity;
    }
    if let Some(history) = toml.stream.history_messages {
        config.history_messages = history;
    }
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut UigenConfigFile, env: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(model) = env("UIGEN_MODEL") {
        config.model = model;
        config.source = ConfigSource::Env;
    }
    if let Some(file) = env("UIGEN_SYSTEM_PROMPT_FILE") {
        config.system_prompt_file = Some(PathBuf::from(file));
        config.source = ConfigSource::Env;
    }
    if let Some(capacity) = env("UIGEN_CHANNEL_CAPACITY") {
        match capacity.parse::<usize>() {
            Ok(n) => {
                config.channel_capacity = n;
                config.source = ConfigSource::Env;
            }
            Err(e) => {
                tracing::warn!(value = %capacity, error = %e, "Ignoring UIGEN_CHANNEL_CAPACITY");
            }
        }
    }
    if let Some(history) = env("UIGEN_HISTORY_MESSAGES") {
        match history.parse::<usize>() {
            Ok(n) => {
                config.history_messages = n;
                config.source = ConfigSource::Env;
            }
            Err(e) => {
                tracing::warn!(value = %history, error = %e, "Ignoring UIGEN_HISTORY_MESSAGES");
            }
        }
    }
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Model override
    pub model: Option<String>,

    /// System prompt file override
    pub system_prompt_file: Option<PathBuf>,

    /// Channel capacity override
    pub channel_capacity: Option<usize>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set system prompt file override
    #[must_use]
    pub fn with_system_prompt_file(mut self, path: PathBuf) -> Self {
        self.system_prompt_file = Some(path);
        self
    }

    /// Set channel capacity override
    #[must_use]
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = Some(capacity);
        self
    }

    /// Apply overrides to a configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the overridden values are
    /// invalid.
    pub fn apply(&self, config: &mut UigenConfigFile) -> Result<(), ConfigError> {
        if self.model.is_some()
            || self.system_prompt_file.is_some()
            || self.channel_capacity.is_some()
        {
            config.source = ConfigSource::Cli;
        }

        if let Some(ref model) = self.model {
            config.model.clone_from(model);
        }
        if let Some(ref path) = self.system_prompt_file {
            config.system_prompt_file = Some(path.clone());
        }
        if let Some(capacity) = self.channel_capacity {
            config.channel_capacity = capacity;
        }

        config.validate()
    }
}

// =============================================================================
// Tests
// =============================================================================
