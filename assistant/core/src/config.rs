//! TOML Configuration File Support
//!
//! Centralized configuration for the assistant core, loaded from a TOML
//! file at `~/.config/dossier/assistant.toml`.
//!
//! # Configuration Priority
//!
//! Values are loaded with the following priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! # Example Configuration
//!
//! ```toml
//! [api]
//! base_url = "https://dossier.example.com"
//! connect_timeout_ms = 10000
//! idle_timeout_ms = 30000
//! event_buffer = 100
//!
//! [autocomplete]
//! focus_grace_ms = 150
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::stream::SessionConfig;

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "DOSSIER_API_URL";

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// API section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiToml {
    /// Base URL of the document-store API
    pub base_url: Option<String>,

    /// Connection timeout in milliseconds
    pub connect_timeout_ms: Option<u64>,

    /// Idle timeout between stream chunks in milliseconds (0 = disabled)
    pub idle_timeout_ms: Option<u64>,

    /// Event channel capacity per stream session
    pub event_buffer: Option<usize>,
}

/// Autocomplete section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutocompleteToml {
    /// Grace window after focus loss in milliseconds
    pub focus_grace_ms: Option<u64>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantToml {
    /// API configuration section
    pub api: ApiToml,

    /// Autocomplete configuration section
    pub autocomplete: AutocompleteToml,
}

/// Resolved configuration for the assistant core
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Base URL of the document-store API
    pub base_url: String,

    /// Connection timeout for opening requests
    pub connect_timeout: Duration,

    /// Idle timeout between stream chunks (`None` = disabled)
    pub idle_timeout: Option<Duration>,

    /// Event channel capacity per stream session
    pub event_buffer: usize,

    /// Grace window after focus loss before autocomplete dismisses
    pub focus_grace: Duration,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            connect_timeout: Duration::from_secs(10),
            idle_timeout: None,
            event_buffer: 100,
            focus_grace: Duration::from_millis(150),
        }
    }
}

impl AssistantConfig {
    /// Session configuration derived from this config
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            event_buffer: self.event_buffer,
            idle_timeout: self.idle_timeout,
        }
    }

    /// Apply a parsed TOML file over the current values
    fn apply_toml(&mut self, file: &AssistantToml) {
        if let Some(ref base_url) = file.api.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(ms) = file.api.connect_timeout_ms {
            self.connect_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = file.api.idle_timeout_ms {
            self.idle_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(capacity) = file.api.event_buffer {
            self.event_buffer = capacity;
        }
        if let Some(ms) = file.autocomplete.focus_grace_ms {
            self.focus_grace = Duration::from_millis(ms);
        }
    }

    /// Apply environment variable overrides
    fn apply_env(&mut self) {
        let override_url = std::env::var(ENV_API_URL)
            .ok()
            .filter(|url| !url.is_empty());
        if let Some(base_url) = override_url {
            self.base_url = base_url;
        }
    }
}

/// Default configuration file path
///
/// `$XDG_CONFIG_HOME/dossier/assistant.toml`, typically
/// `~/.config/dossier/assistant.toml`. Returns `None` when no config
/// directory can be determined.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("dossier").join("assistant.toml"))
}

/// Load configuration with standard priority
///
/// Reads the default config file if it exists, then applies environment
/// overrides. A missing file is not an error; defaults are used.
pub fn load_config() -> Result<AssistantConfig, ConfigError> {
    let mut config = match default_config_path() {
        Some(path) if path.exists() => read_config_file(&path)?,
        _ => AssistantConfig::default(),
    };
    config.apply_env();
    Ok(config)
}

/// Load configuration from a specific file, then apply env overrides
pub fn load_config_from_path(path: &Path) -> Result<AssistantConfig, ConfigError> {
    let mut config = read_config_file(path)?;
    config.apply_env();
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<AssistantConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let file: AssistantToml = toml::from_str(&contents)?;

    let mut config = AssistantConfig::default();
    config.apply_toml(&file);
    tracing::debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}
