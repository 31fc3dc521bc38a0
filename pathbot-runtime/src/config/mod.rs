//! Configuration loading and parsing
//!
//! Loads configuration from flash or the embedded default file.
//! Uses TOML format parsed by a custom no_std parser.

pub mod calibration;
pub mod loader;
pub mod toml;

pub use calibration::{load_calibration, save_calibration, CalibrationError};
pub use loader::{ConfigError, ConfigPersistence, DEFAULT_CONFIG};
pub use toml::{parse_config, ParseError, RobotConfig};
