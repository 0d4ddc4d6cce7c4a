//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{PitstopError, Result};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub monitor: MonitorConfig,

    #[serde(default)]
    pub alerts: AlertConfig,

    #[serde(default)]
    pub radio: RadioConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Link monitor timing
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Silence longer than this marks the vehicle as lost
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_periodic_report_interval_ms")]
    pub periodic_report_interval_ms: u64,

    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

/// Vehicle alert thresholds
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct AlertConfig {
    /// Battery state of charge below this raises low battery (%)
    #[serde(default = "default_low_soc_percent")]
    pub low_soc_percent: f64,

    /// Battery temperature above this raises high temperature (°C)
    #[serde(default = "default_battery_temp_c")]
    pub battery_temp_c: f64,

    /// Motor temperature above this raises high temperature (°C)
    #[serde(default = "default_motor_temp_c")]
    pub motor_temp_c: f64,

    /// Speed above this raises overspeed (km/h)
    #[serde(default = "default_overspeed_kmh")]
    pub overspeed_kmh: f64,
}

/// LoRa receiver module on a serial port
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct RadioConfig {
    #[serde(default = "default_radio_port")]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_open_attempts")]
    pub open_attempts: u32,

    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

/// Telemetry log configuration
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    #[serde(default = "default_telemetry_enabled")]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_timeout_ms() -> u64 { 15000 }
fn default_periodic_report_interval_ms() -> u64 { 30000 }
fn default_poll_interval_ms() -> u64 { 100 }

fn default_low_soc_percent() -> f64 { 20.0 }
fn default_battery_temp_c() -> f64 { 40.0 }
fn default_motor_temp_c() -> f64 { 60.0 }
fn default_overspeed_kmh() -> f64 { 55.0 }

fn default_radio_port() -> String { "/dev/ttyUSB0".to_string() }
fn default_baud_rate() -> u32 { 115200 }
fn default_open_attempts() -> u32 { 10 }
fn default_retry_interval_ms() -> u64 { 500 }

fn default_telemetry_enabled() -> bool { true }
fn default_log_dir() -> String { "./logs".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            periodic_report_interval_ms: default_periodic_report_interval_ms(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            low_soc_percent: default_low_soc_percent(),
            battery_temp_c: default_battery_temp_c(),
            motor_temp_c: default_motor_temp_c(),
            overspeed_kmh: default_overspeed_kmh(),
        }
    }
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            port: default_radio_port(),
            baud_rate: default_baud_rate(),
            open_attempts: default_open_attempts(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: default_telemetry_enabled(),
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

fn invalid(message: impl Into<String>) -> PitstopError {
    PitstopError::Configuration(message.into())
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Missing sections and fields take their defaults.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use pitstop_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.monitor.validate()?;
        self.alerts.validate()?;
        self.radio.validate()?;
        self.telemetry.validate()?;
        Ok(())
    }
}

impl MonitorConfig {
    /// Validate timing values
    ///
    /// # Errors
    ///
    /// Returns error if any interval is zero or out of range, or if the poll
    /// interval is not shorter than the timeout
    pub fn validate(&self) -> Result<()> {
        if self.timeout_ms == 0 || self.timeout_ms > 3_600_000 {
            return Err(invalid("timeout_ms must be between 1 and 3600000"));
        }

        if self.periodic_report_interval_ms == 0 || self.periodic_report_interval_ms > 600_000 {
            return Err(invalid("periodic_report_interval_ms must be between 1 and 600000"));
        }

        if self.poll_interval_ms == 0 || self.poll_interval_ms > 600_000 {
            return Err(invalid("poll_interval_ms must be between 1 and 600000"));
        }

        // Otherwise the timeout could never be observed promptly
        if self.poll_interval_ms >= self.timeout_ms {
            return Err(invalid("poll_interval_ms must be less than timeout_ms"));
        }

        Ok(())
    }
}

impl AlertConfig {
    /// Validate alert thresholds
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("low_soc_percent", self.low_soc_percent),
            ("battery_temp_c", self.battery_temp_c),
            ("motor_temp_c", self.motor_temp_c),
            ("overspeed_kmh", self.overspeed_kmh),
        ] {
            if !value.is_finite() {
                return Err(invalid(format!("{} must be a finite number", name)));
            }
        }

        if !(0.0..=100.0).contains(&self.low_soc_percent) {
            return Err(invalid("low_soc_percent must be between 0 and 100"));
        }

        if self.overspeed_kmh < 0.0 {
            return Err(invalid("overspeed_kmh must not be negative"));
        }

        Ok(())
    }
}

impl RadioConfig {
    /// Validate serial port settings
    pub fn validate(&self) -> Result<()> {
        if self.port.is_empty() {
            return Err(invalid("radio port cannot be empty"));
        }

        if ![9600, 57600, 115200].contains(&self.baud_rate) {
            return Err(invalid("baud_rate must be one of: 9600, 57600, 115200"));
        }

        if self.open_attempts == 0 {
            return Err(invalid("open_attempts must be greater than 0"));
        }

        if self.retry_interval_ms == 0 || self.retry_interval_ms > 60000 {
            return Err(invalid("retry_interval_ms must be between 1 and 60000"));
        }

        Ok(())
    }
}

impl TelemetryConfig {
    /// Validate telemetry log settings
    pub fn validate(&self) -> Result<()> {
        if self.enabled && self.log_dir.is_empty() {
            return Err(invalid("telemetry log_dir cannot be empty when enabled"));
        }

        if self.max_records_per_file == 0 {
            return Err(invalid("max_records_per_file must be greater than 0"));
        }

        if self.max_files_to_keep == 0 {
            return Err(invalid("max_files_to_keep must be greater than 0"));
        }

        if self.format != "jsonl" {
            return Err(invalid("log format must be 'jsonl' (only supported format)"));
        }

        Ok(())
    }
}
