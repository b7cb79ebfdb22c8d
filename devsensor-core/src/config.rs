//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/devsensor/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/devsensor/` (~/.config/devsensor/)
//! - State/Logs: `$XDG_STATE_HOME/devsensor/` (~/.local/state/devsensor/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Sensor and delivery configuration
    #[serde(default)]
    pub sensor: SensorConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

/// What happens to a batch the collector could not take
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Put the batch back at the head of the buffer for the next cycle
    #[default]
    Requeue,
    /// Log the failure and discard the batch
    Drop,
}

/// Sensor configuration
///
/// Loaded once at startup by the host and handed to `SensorCore`.
#[derive(Debug, Deserialize, Clone)]
pub struct SensorConfig {
    /// Master switch. When false `submit` is a no-op and no timers start.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Collector host (e.g., `https://collector.example.com`)
    pub host: Option<String>,

    /// User the events are attributed to
    pub user: Option<String>,

    /// API key for the collector
    pub key: Option<String>,

    /// Tool name reported with every batch
    #[serde(default = "default_tool")]
    pub tool: String,

    /// Seconds between state-change samples
    #[serde(default = "default_state_change_interval")]
    pub state_change_interval_secs: u64,

    /// Seconds between buffer-transition samples
    #[serde(default = "default_buffer_trans_interval")]
    pub buffer_trans_interval_secs: u64,

    /// Whether the buffer-transition sampler runs at all
    #[serde(default = "default_enabled")]
    pub buffer_transitions: bool,

    /// Seconds between timer-driven delivery cycles
    #[serde(default = "default_autosend_interval")]
    pub autosend_interval_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Upper bound on how long `flush_now` waits for its delivery cycle
    #[serde(default = "default_flush_timeout")]
    pub flush_timeout_secs: u64,

    /// Failure policy for batches the collector did not take
    #[serde(default)]
    pub on_failure: FailurePolicy,

    /// Buffer capacity enforced when a failed batch is re-queued
    #[serde(default = "default_max_buffered_events")]
    pub max_buffered_events: usize,

    /// Log per-event status messages at info level
    #[serde(default = "default_enabled")]
    pub monitor: bool,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            host: None,
            user: None,
            key: None,
            tool: default_tool(),
            state_change_interval_secs: default_state_change_interval(),
            buffer_trans_interval_secs: default_buffer_trans_interval(),
            buffer_transitions: default_enabled(),
            autosend_interval_secs: default_autosend_interval(),
            timeout_secs: default_timeout(),
            flush_timeout_secs: default_flush_timeout(),
            on_failure: FailurePolicy::default(),
            max_buffered_events: default_max_buffered_events(),
            monitor: default_enabled(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_tool() -> String {
    "Eclipse".to_string()
}

fn default_state_change_interval() -> u64 {
    30
}

fn default_buffer_trans_interval() -> u64 {
    2
}

fn default_autosend_interval() -> u64 {
    600
}

fn default_timeout() -> u64 {
    30
}

fn default_flush_timeout() -> u64 {
    5
}

fn default_max_buffered_events() -> usize {
    10_000
}

impl SensorConfig {
    /// Check if the sensor is enabled and has a collector to deliver to
    pub fn is_ready(&self) -> bool {
        self.enabled && self.host.is_some() && self.user.is_some() && self.key.is_some()
    }

    /// Validate timing and capacity settings
    ///
    /// Runs for every sensor, whether or not a collector is configured.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("state_change_interval_secs", self.state_change_interval_secs),
            ("buffer_trans_interval_secs", self.buffer_trans_interval_secs),
            ("autosend_interval_secs", self.autosend_interval_secs),
            ("timeout_secs", self.timeout_secs),
            ("flush_timeout_secs", self.flush_timeout_secs),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("sensor.{} must be positive", name)));
            }
        }
        if self.max_buffered_events == 0 {
            return Err(Error::Config(
                "sensor.max_buffered_events must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Validate everything needed to talk to the collector
    pub fn validate_collector(&self) -> Result<()> {
        self.validate()?;

        if self.host.is_none() {
            return Err(Error::Config(
                "sensor.host is required to reach the collector".to_string(),
            ));
        }
        if self.user.is_none() {
            return Err(Error::Config(
                "sensor.user is required to reach the collector".to_string(),
            ));
        }
        if self.key.is_none() {
            return Err(Error::Config(
                "sensor.key is required to reach the collector".to_string(),
            ));
        }
        Ok(())
    }

    pub fn state_change_interval(&self) -> Duration {
        Duration::from_secs(self.state_change_interval_secs)
    }

    pub fn buffer_trans_interval(&self) -> Duration {
        Duration::from_secs(self.buffer_trans_interval_secs)
    }

    pub fn autosend_interval(&self) -> Duration {
        Duration::from_secs(self.autosend_interval_secs)
    }

    pub fn flush_timeout(&self) -> Duration {
        Duration::from_secs(self.flush_timeout_secs)
    }
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/devsensor/config.toml` (~/.config/devsensor/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("devsensor").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/devsensor/` (~/.local/state/devsensor/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("devsensor")
    }
}
