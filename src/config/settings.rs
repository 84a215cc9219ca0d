//! Configuration settings for the bridge.

use serde::Deserialize;
use std::path::{Component, Path};

use crate::error::BridgeError;
use crate::protocol::{DEFAULT_MAX_INBOUND_SIZE, DEFAULT_MAX_OUTBOUND_SIZE};

/// Main configuration structure for the bridge.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub helper: HelperConfig,
}

/// Frame size limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Maximum size of the message read from the browser, in bytes.
    #[serde(default = "default_max_inbound_size")]
    pub max_inbound_size: usize,
    /// Maximum size of the response written to the browser, in bytes.
    #[serde(default = "default_max_outbound_size")]
    pub max_outbound_size: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format ("pretty" or "json").
    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Helper file names probed in the install directory.
#[derive(Debug, Clone, Deserialize)]
pub struct HelperConfig {
    /// Script probed on Unix-family platforms.
    #[serde(default = "default_unix_script")]
    pub unix_script: String,
    /// Candidates probed in order on Windows.
    #[serde(default = "default_windows_candidates")]
    pub windows_candidates: Vec<String>,
}

// Default value functions
fn default_max_inbound_size() -> usize {
    DEFAULT_MAX_INBOUND_SIZE
}

fn default_max_outbound_size() -> usize {
    DEFAULT_MAX_OUTBOUND_SIZE
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_unix_script() -> String {
    "helper.sh".to_string()
}

fn default_windows_candidates() -> Vec<String> {
    vec!["helper.exe".to_string(), "helper.ps1".to_string()]
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_inbound_size: default_max_inbound_size(),
            max_outbound_size: default_max_outbound_size(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for HelperConfig {
    fn default() -> Self {
        Self {
            unix_script: default_unix_script(),
            windows_candidates: default_windows_candidates(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, BridgeError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| BridgeError::Config {
            message: format!("Failed to read config file '{}': {}", path.display(), e),
        })?;

        Self::from_toml(&content).map_err(|e| BridgeError::Config {
            message: format!("Invalid config file '{}': {}", path.display(), e),
        })
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, BridgeError> {
        let settings: Settings = toml::from_str(content).map_err(|e| BridgeError::Config {
            message: e.to_string(),
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Validate the settings.
    pub fn validate(&self) -> Result<(), BridgeError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(BridgeError::Config {
                message: format!(
                    "Invalid log level '{}'. Valid levels: {:?}",
                    self.logging.level, valid_levels
                ),
            });
        }

        let valid_formats = ["pretty", "json"];
        if !valid_formats.contains(&self.logging.format.to_lowercase().as_str()) {
            return Err(BridgeError::Config {
                message: format!(
                    "Invalid log format '{}'. Valid formats: {:?}",
                    self.logging.format, valid_formats
                ),
            });
        }

        // The length prefix is a u32
        if self.limits.max_inbound_size == 0 || self.limits.max_inbound_size > u32::MAX as usize {
            return Err(BridgeError::Config {
                message: format!(
                    "Invalid max_inbound_size {}. Must be between 1 and {}",
                    self.limits.max_inbound_size,
                    u32::MAX
                ),
            });
        }

        // The browser drops anything larger
        if self.limits.max_outbound_size == 0
            || self.limits.max_outbound_size > DEFAULT_MAX_OUTBOUND_SIZE
        {
            return Err(BridgeError::Config {
                message: format!(
                    "Invalid max_outbound_size {}. Must be between 1 and {}",
                    self.limits.max_outbound_size, DEFAULT_MAX_OUTBOUND_SIZE
                ),
            });
        }

        if self.helper.windows_candidates.is_empty() {
            return Err(BridgeError::Config {
                message: "Helper candidate list must not be empty".to_string(),
            });
        }

        // Helpers are only ever run from the install directory
        let names = std::iter::once(&self.helper.unix_script)
            .chain(self.helper.windows_candidates.iter());
        for name in names {
            if !is_plain_file_name(name) {
                return Err(BridgeError::Config {
                    message: format!(
                        "Invalid helper name '{}'. Must be a bare file name",
                        name
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Whether `name` is a single file name with no directory part.
pub fn is_plain_file_name(name: &str) -> bool {
    if name.trim().is_empty() || name.contains(['/', '\\']) {
        return false;
    }

    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
