//! Configuration persistence
//!
//! Loads the robot configuration from flash storage.
//! Falls back to the embedded default file if flash is empty or invalid.

use core::str;

use pathbot_hal::{FlashError, FlashStorage, StorageKey};

use super::toml::{parse_config, ParseError, RobotConfig};

/// Maximum TOML config size
const MAX_TOML_SIZE: usize = 4096;

/// Configuration shipped with the firmware
pub const DEFAULT_CONFIG: &str = include_str!("../../robot.toml");

/// Configuration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Flash operation failed
    Flash(FlashError),
    /// TOML parsing failed
    TomlParse(ParseError),
    /// Invalid UTF-8 in TOML data
    InvalidUtf8,
    /// TOML text does not fit the read buffer
    TooLarge,
}

impl From<FlashError> for ConfigError {
    fn from(e: FlashError) -> Self {
        ConfigError::Flash(e)
    }
}

impl From<ParseError> for ConfigError {
    fn from(e: ParseError) -> Self {
        ConfigError::TomlParse(e)
    }
}

/// Configuration persistence manager
///
/// Handles loading and storing the robot configuration.
pub struct ConfigPersistence<S> {
    storage: S,
}

impl<S: FlashStorage> ConfigPersistence<S> {
    /// Create a new config persistence manager
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Consume this persistence manager and return the underlying storage
    ///
    /// Use this to reclaim the storage after loading config, so it can
    /// be used for calibration persistence.
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Load configuration
    ///
    /// Tries the TOML stored in flash, then the embedded default file, then
    /// built-in defaults. Never fails.
    pub async fn load(&mut self) -> RobotConfig {
        info!("Loading configuration from flash...");

        match self.load_toml().await {
            Ok(config) => {
                info!("Loaded configuration from flash");
                log_config_summary(&config);
                return config;
            }
            Err(ConfigError::Flash(FlashError::NotFound)) => {
                debug!("No TOML config in flash, using embedded file");
            }
            Err(e) => {
                warn!("Failed to load TOML config: {:?}, using embedded file", e);
            }
        }

        let config = match parse_config(DEFAULT_CONFIG) {
            Ok(config) => config,
            Err(e) => {
                warn!("Embedded config invalid: {:?}, using defaults", e);
                RobotConfig::default()
            }
        };
        log_config_summary(&config);
        config
    }

    /// Validate and store new TOML configuration text
    pub async fn store(&mut self, toml: &str) -> Result<RobotConfig, ConfigError> {
        if toml.len() > MAX_TOML_SIZE {
            return Err(ConfigError::TooLarge);
        }
        let config = parse_config(toml)?;

        self.storage
            .write(StorageKey::RobotConfigToml, toml.as_bytes())
            .await?;

        info!("Stored {} bytes of TOML config", toml.len());
        Ok(config)
    }

    /// Load configuration from the TOML stored in flash
    async fn load_toml(&mut self) -> Result<RobotConfig, ConfigError> {
        let mut buffer = [0u8; MAX_TOML_SIZE];
        let len = self
            .storage
            .read(StorageKey::RobotConfigToml, &mut buffer)
            .await
            .map_err(|e| match e {
                FlashError::BufferTooSmall => ConfigError::TooLarge,
                e => ConfigError::Flash(e),
            })?;

        debug!("Read {} bytes of TOML from flash", len);

        let toml_str = str::from_utf8(&buffer[..len]).map_err(|_| ConfigError::InvalidUtf8)?;

        Ok(parse_config(toml_str)?)
    }
}

/// Log a summary of the loaded configuration
fn log_config_summary(config: &RobotConfig) {
    let mission = &config.mission;
    info!("Configuration loaded successfully");
    debug!("  {} colors", config.profile.len());
    debug!("  {} spokes", mission.spokes.len());
    debug!("  {} warehouse procedures", mission.warehouses.len());
    debug!("  drop-off zone: {}", mission.drop_off.is_some());
    debug!("  tick {} ms", mission.tick_ms);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::mock::MemoryStorage;
    use embassy_futures::block_on;

    #[test]
    fn test_embedded_config_parses() {
        let config = parse_config(DEFAULT_CONFIG).unwrap();
        assert_eq!(config.mission.steering.drive_speed, 75.0);
        assert!(config.profile.id("yellow-line").is_some());
    }

    #[test]
    fn test_load_falls_back_to_embedded() {
        let mut persistence = ConfigPersistence::new(MemoryStorage::new());
        let config = block_on(persistence.load());
        assert_eq!(config, parse_config(DEFAULT_CONFIG).unwrap());
    }

    #[test]
    fn test_store_then_load() {
        let mut persistence = ConfigPersistence::new(MemoryStorage::new());
        let stored = block_on(persistence.store("tolerance = 12\n")).unwrap();
        assert_eq!(stored.mission.tolerance, 12);

        let loaded = block_on(persistence.load());
        assert_eq!(loaded.mission.tolerance, 12);
    }

    #[test]
    fn test_store_rejects_invalid_toml() {
        let mut persistence = ConfigPersistence::new(MemoryStorage::new());
        assert_eq!(
            block_on(persistence.store("[nowhere]\n")),
            Err(ConfigError::TomlParse(ParseError::InvalidSection))
        );
        assert!(!block_on(
            persistence
                .into_storage()
                .exists(StorageKey::RobotConfigToml)
        ));
    }

    #[test]
    fn test_invalid_flash_contents_fall_back() {
        let mut storage = MemoryStorage::new();
        block_on(storage.write(StorageKey::RobotConfigToml, &[0xFF, 0xFE])).unwrap();

        let mut persistence = ConfigPersistence::new(storage);
        assert_eq!(
            block_on(persistence.load_toml()),
            Err(ConfigError::InvalidUtf8)
        );
        assert_eq!(
            block_on(persistence.load()),
            parse_config(DEFAULT_CONFIG).unwrap()
        );
    }
}
