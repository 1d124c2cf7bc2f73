//! Configuration loading
//!
//! Files are loaded in order, later files replacing earlier sections:
//! 1. `~/.config/jack-capture/config.toml` (user)
//! 2. `./jack-capture.toml`, or the path given on the command line
//!
//! ```toml
//! [client]
//! ring_buffer_capacity = 256
//! port_prefix = "in_"
//!
//! [logging]
//! level = "info"
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::{DEFAULT_PORT_PREFIX, RING_BUFFER_CAPACITY};
use crate::error::ConfigError;

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}

/// JACK client settings shared by every source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Frames buffered between the process thread and the host
    pub ring_buffer_capacity: usize,
    /// Short name prefix for registered input ports
    pub port_prefix: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            ring_buffer_capacity: RING_BUFFER_CAPACITY,
            port_prefix: DEFAULT_PORT_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl SourceConfig {
    /// Load from the standard locations, with an optional override path
    pub fn load(override_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = SourceConfig::default();
        for path in discover_config_files(override_path) {
            tracing::debug!(path = %path.display(), "loading config file");
            config = load_from_file(&path)?;
        }
        Ok(config)
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

/// Config files that exist, in load order
pub fn discover_config_files(override_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("jack-capture/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = override_path {
        if path.exists() {
            files.push(path.to_path_buf());
        } else {
            tracing::warn!(path = %path.display(), "config file not found");
        }
        return files;
    }

    let local = PathBuf::from("jack-capture.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Load config from a TOML file. Missing keys take their defaults.
pub fn load_from_file(path: &Path) -> Result<SourceConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e: toml::de::Error| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
