//! Configuration management for Echo Ranger.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use echo_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/echo-ranger.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Data folder: {}", config.settings().paths.data_folder);
//!
//! config.settings_mut().display.quantization_step_m = 0.01;
//! config.update_section(ConfigSection::Display).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult, DEFAULT_CONFIG_PATH};
pub use settings::{
    CalibrationSettings, ConfigSection, DetectionSettings, DisplaySettings, LoggingSettings,
    PathSettings, Settings,
};
