//! Configuration data model, validation, and file handling

pub mod parser;

pub use parser::load_config;

use crate::error::{AppError, Result};
use crate::types::{ExportCadence, GpsPolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
///
/// Backed by a JSON file that is created with defaults on first run; keys
/// missing from an existing file are merged in and written back, so upgrades
/// never silently drop new settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Display name broadcast in presence announces
    #[serde(default = "default_display_name")]
    pub display_name: String,

    /// Seconds between presence announces
    #[serde(default = "default_announce_interval")]
    pub announce_interval: u64,

    /// Seconds between probes
    #[serde(default = "default_ping_interval")]
    pub ping_interval: u64,

    /// Seconds to pause immediately before each send
    #[serde(default)]
    pub ping_delay: u64,

    /// Seconds to wait for a response before counting a loss
    #[serde(default = "default_ping_timeout")]
    pub ping_timeout: u64,

    /// Seconds to wait for the destination to resolve before the probe loop
    /// starts (probes are deferred, not dropped, if it never does)
    #[serde(default = "default_path_establishment_wait")]
    pub path_establishment_wait: u64,

    /// Seconds to wait after resolution before the first probe
    #[serde(default = "default_pre_ping_delay")]
    pub pre_ping_delay: u64,

    /// Destination address of the base station responder
    #[serde(default)]
    pub base_station_destination: String,

    /// Directory the export files are written into
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// What to do with measurements that lack a geolocation fix
    #[serde(default)]
    pub gps_policy: GpsPolicy,

    /// When to render the export files
    #[serde(default)]
    pub export_cadence: ExportCadence,

    /// Seconds to wait for the location provider before giving up
    #[serde(default = "default_location_timeout")]
    pub location_timeout: u64,

    /// Command line queried for a location fix, split on whitespace
    #[serde(default = "default_location_command")]
    pub location_command: String,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_name: default_display_name(),
            announce_interval: default_announce_interval(),
            ping_interval: default_ping_interval(),
            ping_delay: 0,
            ping_timeout: default_ping_timeout(),
            path_establishment_wait: default_path_establishment_wait(),
            pre_ping_delay: default_pre_ping_delay(),
            base_station_destination: String::new(),
            export_dir: default_export_dir(),
            gps_policy: GpsPolicy::default(),
            export_cadence: ExportCadence::default(),
            location_timeout: default_location_timeout(),
            location_command: default_location_command(),
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn announce_interval(&self) -> Duration {
        Duration::from_secs(self.announce_interval)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval)
    }

    pub fn ping_delay(&self) -> Duration {
        Duration::from_secs(self.ping_delay)
    }

    pub fn ping_timeout(&self) -> Duration {
        Duration::from_secs(self.ping_timeout)
    }

    pub fn path_establishment_wait(&self) -> Duration {
        Duration::from_secs(self.path_establishment_wait)
    }

    pub fn pre_ping_delay(&self) -> Duration {
        Duration::from_secs(self.pre_ping_delay)
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_secs(self.location_timeout)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.display_name.is_empty() {
            return Err(AppError::config("Display name cannot be empty"));
        }

        if self.ping_interval == 0 {
            return Err(AppError::config("Ping interval must be greater than 0"));
        }

        if self.ping_timeout == 0 {
            return Err(AppError::config("Ping timeout must be greater than 0"));
        }

        if self.announce_interval == 0 {
            return Err(AppError::config("Announce interval must be greater than 0"));
        }

        if self.location_timeout == 0 || self.location_timeout > 60 {
            return Err(AppError::config(
                "Location timeout must be between 1 and 60 seconds",
            ));
        }

        if self.location_command.split_whitespace().next().is_none() {
            return Err(AppError::config("Location command cannot be empty"));
        }

        if self.export_dir.as_os_str().is_empty() {
            return Err(AppError::config("Export directory cannot be empty"));
        }

        Ok(())
    }

    /// Load configuration from a JSON file, creating it with defaults when
    /// missing and merging new keys back into an existing file
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .map_err(|e| AppError::config(format!("Failed to read {}: {}", path.display(), e)))?;

            let file_keys = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&contents)
                .map(|m| m.len())
                .unwrap_or(0);

            let config: Config = serde_json::from_str(&contents)
                .map_err(|e| AppError::config(format!("Invalid config {}: {}", path.display(), e)))?;

            // Write back when defaults filled in keys the file did not have
            let merged = serde_json::to_value(&config)
                .map_err(|e| AppError::internal(format!("Config serialize failed: {}", e)))?;
            if merged.as_object().map(|m| m.len()).unwrap_or(0) > file_keys {
                config.save(path)?;
            }

            Ok(config)
        } else {
            let config = Config::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Write the configuration out as pretty-printed JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| AppError::io(format!("Failed to create {}: {}", parent.display(), e)))?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::internal(format!("Config serialize failed: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| AppError::io(format!("Failed to write {}: {}", path.display(), e)))
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(name) = std::env::var("MRT_DISPLAY_NAME") {
            if !name.trim().is_empty() {
                self.display_name = name.trim().to_string();
            }
        }

        if let Ok(dest) = std::env::var("MRT_DESTINATION") {
            if !dest.trim().is_empty() {
                self.base_station_destination = dest.trim().to_string();
            }
        }

        if let Ok(interval) = std::env::var("MRT_PING_INTERVAL") {
            self.ping_interval = interval
                .parse()
                .map_err(|e| AppError::config(format!("Invalid MRT_PING_INTERVAL value '{}': {}", interval, e)))?;
        }

        if let Ok(timeout) = std::env::var("MRT_PING_TIMEOUT") {
            self.ping_timeout = timeout
                .parse()
                .map_err(|e| AppError::config(format!("Invalid MRT_PING_TIMEOUT value '{}': {}", timeout, e)))?;
        }

        if let Ok(dir) = std::env::var("MRT_EXPORT_DIR") {
            if !dir.trim().is_empty() {
                self.export_dir = PathBuf::from(dir.trim());
            }
        }

        Ok(())
    }
}

// Default value functions for serde

fn default_display_name() -> String {
    crate::defaults::DEFAULT_DISPLAY_NAME.to_string()
}

fn default_announce_interval() -> u64 {
    crate::defaults::DEFAULT_ANNOUNCE_INTERVAL.as_secs()
}

fn default_ping_interval() -> u64 {
    crate::defaults::DEFAULT_PING_INTERVAL.as_secs()
}

fn default_ping_timeout() -> u64 {
    crate::defaults::DEFAULT_PING_TIMEOUT.as_secs()
}

fn default_path_establishment_wait() -> u64 {
    crate::defaults::DEFAULT_PATH_ESTABLISHMENT_WAIT.as_secs()
}

fn default_pre_ping_delay() -> u64 {
    crate::defaults::DEFAULT_PRE_PING_DELAY.as_secs()
}

fn default_export_dir() -> PathBuf {
    PathBuf::from(crate::defaults::DEFAULT_EXPORT_DIR)
}

fn default_location_timeout() -> u64 {
    crate::defaults::DEFAULT_LOCATION_TIMEOUT.as_secs()
}

fn default_location_command() -> String {
    crate::defaults::DEFAULT_LOCATION_COMMAND.to_string()
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}
