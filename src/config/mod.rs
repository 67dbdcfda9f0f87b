//! Configuration module for the operator panel
//!
//! This module holds the startup configuration:
//! - Serial link parameters (port, baud rate, timeouts)
//! - Acquisition parameters (channel, tick interval, history capacity)
//! - Emulation and UI preferences
//!
//! # Config Location
//!
//! An optional `config.toml` is read from the platform config directory under
//! `dev.modbus-ai-panel`:
//!
//! - **Linux**: `~/.config/dev.modbus-ai-panel/config.toml`
//! - **macOS**: `~/Library/Application Support/dev.modbus-ai-panel/config.toml`
//! - **Windows**: `%APPDATA%\dev.modbus-ai-panel\config.toml`
//!
//! The file is only ever read. Settings changed in the panel live for the
//! duration of the process.
//!
//! # Example
//!
//! ```toml
//! [serial]
//! port = "COM3"
//! baud_rate = 19200
//!
//! [acquisition]
//! channel = 3
//! failed_read_policy = "skip_failures"
//! ```

use crate::error::{PanelError, Result, ResultExt};
use crate::types::Channel;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for config directories
pub const APP_ID: &str = "dev.modbus-ai-panel";

/// Config filename
pub const CONFIG_FILE: &str = "config.toml";

/// Baud rates offered by the picker
pub const SUPPORTED_BAUD_RATES: [u32; 5] = [9600, 19200, 38400, 57600, 115200];

/// Default baud rate
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Bound on opening the serial transport
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 2000;

/// Bound on a single register read
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;

/// Periodic sampling interval
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;

/// Number of samples kept for the chart
pub const DEFAULT_HISTORY_CAPACITY: usize = 200;

/// Get the path to the config file
pub fn config_path() -> Option<PathBuf> {
    dirs_next::config_dir().map(|p| p.join(APP_ID).join(CONFIG_FILE))
}

// ==================== App Config ====================

/// Complete startup configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    /// Serial link configuration
    #[serde(default)]
    pub serial: SerialConfig,

    /// Sampling configuration
    #[serde(default)]
    pub acquisition: AcquisitionConfig,

    /// Emulation configuration
    #[serde(default)]
    pub emulation: EmulationConfig,

    /// UI configuration
    #[serde(default)]
    pub ui: UiConfig,
}

impl AppConfig {
    /// Parse and validate a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path))
    }

    /// Load the config from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            tracing::warn!("Could not determine config directory, using defaults");
            return Self::default();
        };

        if !path.exists() {
            tracing::debug!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Check value ranges that serde cannot express
    pub fn validate(&self) -> Result<()> {
        Channel::new(self.acquisition.channel)?;

        if self.serial.baud_rate == 0 {
            return Err(PanelError::Config("baud_rate must be positive".to_string()));
        }
        if self.serial.connect_timeout_ms == 0 || self.serial.read_timeout_ms == 0 {
            return Err(PanelError::Config("timeouts must be positive".to_string()));
        }
        if self.acquisition.tick_interval_ms == 0 {
            return Err(PanelError::Config(
                "tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.acquisition.history_capacity == 0 {
            return Err(PanelError::Config(
                "history_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured channel (validated on load, falls back to channel 1)
    pub fn channel(&self) -> Channel {
        Channel::new(self.acquisition.channel).unwrap_or_default()
    }
}

// ==================== Serial Config ====================

/// Serial link configuration
///
/// Parity, stop bits, data bits and the device unit id are fixed by the
/// analog input module and live in [`crate::backend::transport::SerialSettings`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SerialConfig {
    /// Port identifier (e.g. "COM3" or "/dev/ttyUSB0"); empty until chosen
    pub port: String,

    /// Baud rate
    pub baud_rate: u32,

    /// Timeout for opening the port in milliseconds
    pub connect_timeout_ms: u64,

    /// Timeout for a register read in milliseconds
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: DEFAULT_BAUD_RATE,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
        }
    }
}

impl SerialConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

// ==================== Acquisition Config ====================

/// What a failed periodic read contributes to the sample history
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailedReadPolicy {
    /// Append 0.0 so the trace always shows something
    #[default]
    AppendZero,
    /// Leave failed ticks out of the history
    SkipFailures,
}

impl std::fmt::Display for FailedReadPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailedReadPolicy::AppendZero => write!(f, "Append zero"),
            FailedReadPolicy::SkipFailures => write!(f, "Skip failures"),
        }
    }
}

/// Sampling configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AcquisitionConfig {
    /// Analog input channel (1..=8)
    pub channel: u8,

    /// Periodic tick interval in milliseconds
    pub tick_interval_ms: u64,

    /// Number of samples kept for display
    pub history_capacity: usize,

    /// History policy for failed reads
    pub failed_read_policy: FailedReadPolicy,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            channel: 1,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            failed_read_policy: FailedReadPolicy::default(),
        }
    }
}

impl AcquisitionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

// ==================== Emulation Config ====================

/// Emulation configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct EmulationConfig {
    /// Start in emulation mode
    pub enabled: bool,
}

// ==================== UI Config ====================

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct UiConfig {
    /// Use the dark theme
    pub dark_mode: bool,

    /// Decimal places for the value label
    pub value_decimals: usize,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            dark_mode: true,
            value_decimals: 3,
        }
    }
}

// ==================== Tests ====================
