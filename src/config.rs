//! Configuration management for Serre
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files with support for environment variable overrides.

use crate::error::{Result, SerreError};
use serde::{Deserialize, Serialize};
use std::path::Path;

mod defaults;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Config {
    /// TCW241 Modbus TCP endpoint
    pub device: DeviceConfig,

    /// Register map of the monitored channels
    pub registers: RegistersConfig,

    /// Web server binding and static files
    pub web: WebConfig,

    /// Token signing and user storage
    pub auth: AuthConfig,

    /// Rolling measurement history
    pub history: HistoryConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Modbus TCP connection parameters for the I/O module
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct DeviceConfig {
    /// Host name or IP address of the TCW241
    pub host: String,

    /// TCP port (typically 502)
    pub port: u16,

    /// Modbus unit identifier
    pub unit_id: u8,

    /// Timeout for establishing the TCP connection
    pub connect_timeout_ms: u64,

    /// Timeout for a single register read
    pub read_timeout_ms: u64,
}

/// Holding-register addresses, each the start of a 2-register float
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct RegistersConfig {
    /// Temperature sensor (degrees Celsius)
    pub temperature: u16,

    /// Analog humidity inputs 1 to 3 (volts, 0-5 V)
    pub humidity: [u16; 3],
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct WebConfig {
    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,

    /// Directory holding the dashboard files
    pub static_dir: String,

    /// Page served at `/`, relative to `static_dir`
    pub index_file: String,
}

/// Authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret used to sign session tokens
    #[serde(skip_serializing)]
    pub jwt_secret: String,

    /// Token lifetime in hours
    pub token_ttl_hours: u32,

    /// JSON file holding registered users
    pub users_file: String,
}

/// Measurement history configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct HistoryConfig {
    /// JSON file holding the rolling history
    pub file: String,

    /// Maximum number of stored entries; oldest entries are evicted first
    pub max_entries: usize,

    /// Window returned by `/api/history` when no `hours` is given
    pub default_hours: u32,

    /// Largest window a client may request
    pub max_hours: u32,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Optional per-output override for the console
    pub console_level: Option<String>,

    /// Optional per-output override for the log file
    pub file_level: Option<String>,

    /// Path to log file (its directory receives the daily rotated files)
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the first default location that exists
    pub fn load() -> Result<Self> {
        let default_paths = [
            "serre_config.yaml",
            "/data/serre_config.yaml",
            "/etc/serre/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Apply `SERRE_*` environment overrides on top of the loaded file
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERRE_DEVICE_HOST").filter(|h| !h.is_empty()) {
            self.device.host = host;
        }
        if let Some(port) = lookup("SERRE_DEVICE_PORT") {
            self.device.port = parse_port("SERRE_DEVICE_PORT", &port)?;
        }
        if let Some(port) = lookup("SERRE_WEB_PORT") {
            self.web.port = parse_port("SERRE_WEB_PORT", &port)?;
        }
        if let Some(secret) = lookup("SERRE_JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.device.host.trim().is_empty() {
            return Err(SerreError::validation(
                "device.host",
                "Host cannot be empty",
            ));
        }

        if self.device.port == 0 {
            return Err(SerreError::validation(
                "device.port",
                "Port must be greater than 0",
            ));
        }

        if self.device.connect_timeout_ms == 0 || self.device.read_timeout_ms == 0 {
            return Err(SerreError::validation(
                "device",
                "Timeouts must be greater than 0",
            ));
        }

        let [h1, h2, h3] = self.registers.humidity;
        if h1 == h2 || h1 == h3 || h2 == h3 {
            return Err(SerreError::validation(
                "registers.humidity",
                "Humidity channels must use distinct registers",
            ));
        }

        if self.web.port == 0 {
            return Err(SerreError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        if self.auth.jwt_secret.is_empty() {
            return Err(SerreError::validation(
                "auth.jwt_secret",
                "Secret cannot be empty (set SERRE_JWT_SECRET)",
            ));
        }

        if self.auth.token_ttl_hours == 0 {
            return Err(SerreError::validation(
                "auth.token_ttl_hours",
                "Must be greater than 0",
            ));
        }

        if self.history.max_entries == 0 {
            return Err(SerreError::validation(
                "history.max_entries",
                "Must be greater than 0",
            ));
        }

        if self.history.default_hours == 0 || self.history.default_hours > self.history.max_hours {
            return Err(SerreError::validation(
                "history.default_hours",
                "Must be between 1 and history.max_hours",
            ));
        }

        Ok(())
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .trim()
        .parse::<u16>()
        .map_err(|e| SerreError::config(format!("{} is not a valid port: {}", key, e)))
}
