//!
//! Demo configuration.
//!
//! Everything has a default, so the demo runs without a configuration file.
//! A TOML file only needs the values it changes:
//!
//! ```toml
//! run_for_ms = 5000
//!
//! [battery]
//! start_mv = 3600
//! drain_mv = 5
//! ```
//!

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use notifier_pubsub::DispatcherConfig;

/// An error loading the demo configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("unable to read {}", path.display())]
    Read {
        /// The file that was read
        path: PathBuf,
        /// The underlying error
        #[source]
        source: std::io::Error,
    },
    /// The file is not valid TOML for the configuration
    #[error("invalid configuration")]
    Parse(#[from] toml::de::Error),
    /// The values are inconsistent
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// The whole demo configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RobotConfig {
    /// Stop after this many milliseconds instead of waiting for Ctrl-C
    #[serde(default)]
    pub run_for_ms: Option<u64>,

    /// Dispatcher table sizes
    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    /// Dispatch pump and error reporter periods
    #[serde(default)]
    pub pump: PumpConfig,

    /// Keypad manager
    #[serde(default)]
    pub keypad: KeypadConfig,

    /// Battery manager
    #[serde(default)]
    pub battery: BatteryConfig,

    /// Display manager
    #[serde(default)]
    pub display: DisplayConfig,
}

/// Dispatch pump and error reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PumpConfig {
    /// Pump period in microseconds
    #[serde(default = "default_pump_period_us")]
    pub period_us: u64,

    /// Error reporter period in microseconds
    #[serde(default = "default_report_period_us")]
    pub report_period_us: u64,
}

/// Keypad manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeypadConfig {
    /// Scan period in microseconds
    #[serde(default = "default_keypad_period_us")]
    pub period_us: u64,

    /// Stable samples required to accept an edge
    #[serde(default = "default_debounce_samples")]
    pub debounce_samples: u16,

    /// Scans a key is held before it counts as a long press
    #[serde(default = "default_long_press_scans")]
    pub long_press_scans: u32,

    /// Chance that a single scan reads the wrong level
    #[serde(default = "default_bounce")]
    pub bounce: f64,

    /// Outgoing queue capacity
    #[serde(default = "default_queue")]
    pub queue: usize,
}

/// Battery manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryConfig {
    /// Sample period in microseconds
    #[serde(default = "default_battery_period_us")]
    pub period_us: u64,

    /// Samples required to settle on a new level
    #[serde(default = "default_battery_samples")]
    pub samples: u16,

    /// A warn reading at or above this is normal again (mV)
    #[serde(default = "default_normal_mv")]
    pub normal_mv: u16,

    /// A normal reading below this is a warning (mV)
    #[serde(default = "default_warn_mv")]
    pub warn_mv: u16,

    /// A warn reading below this is low (mV)
    #[serde(default = "default_low_mv")]
    pub low_mv: u16,

    /// The simulated cell voltage at start (mV)
    #[serde(default = "default_start_mv")]
    pub start_mv: u16,

    /// The simulated drain per sample (mV)
    #[serde(default = "default_drain_mv")]
    pub drain_mv: u16,

    /// The simulated measurement noise (+/- mV)
    #[serde(default = "default_noise_mv")]
    pub noise_mv: u16,

    /// Samples between two raw level reports
    #[serde(default = "default_report_every")]
    pub report_every: u32,

    /// Outgoing queue capacity
    #[serde(default = "default_queue")]
    pub queue: usize,
}

/// Display manager configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayConfig {
    /// Refresh period in microseconds
    #[serde(default = "default_display_period_us")]
    pub period_us: u64,

    /// How long one refresh waits for a notifier in milliseconds
    #[serde(default = "default_receive_timeout_ms")]
    pub receive_timeout_ms: u64,

    /// Incoming queue capacity
    #[serde(default = "default_queue")]
    pub queue: usize,
}

// Default value functions
fn default_pump_period_us() -> u64 {
    1_000
}

fn default_report_period_us() -> u64 {
    1_000_000
}

fn default_keypad_period_us() -> u64 {
    5_000
}

fn default_debounce_samples() -> u16 {
    4
}

fn default_long_press_scans() -> u32 {
    200
}

fn default_bounce() -> f64 {
    0.05
}

fn default_queue() -> usize {
    8
}

fn default_battery_period_us() -> u64 {
    20_000
}

fn default_battery_samples() -> u16 {
    5
}

fn default_normal_mv() -> u16 {
    3_700
}

fn default_warn_mv() -> u16 {
    3_500
}

fn default_low_mv() -> u16 {
    3_300
}

fn default_start_mv() -> u16 {
    3_800
}

fn default_drain_mv() -> u16 {
    1
}

fn default_noise_mv() -> u16 {
    15
}

fn default_report_every() -> u32 {
    25
}

fn default_display_period_us() -> u64 {
    10_000
}

fn default_receive_timeout_ms() -> u64 {
    5
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            period_us: default_pump_period_us(),
            report_period_us: default_report_period_us(),
        }
    }
}

impl Default for KeypadConfig {
    fn default() -> Self {
        Self {
            period_us: default_keypad_period_us(),
            debounce_samples: default_debounce_samples(),
            long_press_scans: default_long_press_scans(),
            bounce: default_bounce(),
            queue: default_queue(),
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            period_us: default_battery_period_us(),
            samples: default_battery_samples(),
            normal_mv: default_normal_mv(),
            warn_mv: default_warn_mv(),
            low_mv: default_low_mv(),
            start_mv: default_start_mv(),
            drain_mv: default_drain_mv(),
            noise_mv: default_noise_mv(),
            report_every: default_report_every(),
            queue: default_queue(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            period_us: default_display_period_us(),
            receive_timeout_ms: default_receive_timeout_ms(),
            queue: default_queue(),
        }
    }
}

impl RobotConfig {
    /// Load the configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// Parse and validate the configuration from TOML text
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: RobotConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the values that must agree with each other
    pub fn validate(&self) -> Result<(), ConfigError> {
        let battery = &self.battery;
        if !(battery.normal_mv > battery.warn_mv && battery.warn_mv > battery.low_mv) {
            return Err(ConfigError::Invalid(format!(
                "battery thresholds must satisfy normal > warn > low, got {} / {} / {}",
                battery.normal_mv, battery.warn_mv, battery.low_mv
            )));
        }
        if !(0.0..1.0).contains(&self.keypad.bounce) {
            return Err(ConfigError::Invalid(format!(
                "keypad bounce must be in [0, 1), got {}",
                self.keypad.bounce
            )));
        }
        for (name, queue) in [
            ("keypad", self.keypad.queue),
            ("battery", self.battery.queue),
            ("display", self.display.queue),
        ] {
            if queue == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{name} queue must hold at least one notifier"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_is_the_default() {
        assert_eq!(RobotConfig::parse("").unwrap(), RobotConfig::default());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = RobotConfig::parse(
            r#"
            run_for_ms = 250

            [dispatcher]
            max_subscribers = 4

            [battery]
            start_mv = 3600
            "#,
        )
        .unwrap();

        assert_eq!(config.run_for_ms, Some(250));
        assert_eq!(config.dispatcher.max_subscribers, 4);
        assert_eq!(config.dispatcher.max_publishers, 16);
        assert_eq!(config.battery.start_mv, 3_600);
        assert_eq!(config.battery.warn_mv, 3_500);
        assert_eq!(config.keypad, KeypadConfig::default());
    }

    #[test]
    fn test_thresholds_out_of_order_are_rejected() {
        let err = RobotConfig::parse(
            r#"
            [battery]
            warn_mv = 3800
            "#,
        )
        .unwrap_err();

        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_zero_queue_is_rejected() {
        let err = RobotConfig::parse("[display]\nqueue = 0\n").unwrap_err();
        assert!(err.to_string().contains("display queue"));
    }

    #[test]
    fn test_malformed_toml_is_a_parse_error() {
        let err = RobotConfig::parse("run_for_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        let err = RobotConfig::load("/definitely/not/here/robot.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
