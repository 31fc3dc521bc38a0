//! Calibration data persistence
//!
//! Loads and saves the calibrated color table to flash storage.

use pathbot_core::color::ColorProfile;
use pathbot_core::config::ColorCalibration;
use pathbot_hal::{FlashError, FlashStorage, StorageKey};

/// Maximum serialized calibration size
const MAX_CALIBRATION_SIZE: usize = 512;

/// Calibration persistence errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationError {
    /// Flash operation failed
    Flash(FlashError),
    /// Deserialization failed
    Deserialize,
    /// Serialization failed
    Serialize,
    /// CRC check failed
    CrcMismatch,
    /// Invalid magic or version
    InvalidFormat,
}

impl From<FlashError> for CalibrationError {
    fn from(e: FlashError) -> Self {
        CalibrationError::Flash(e)
    }
}

/// Load the calibrated color table from flash
///
/// Returns `fallback` (normally the table from the config file) if no
/// calibration is stored or the stored data is invalid.
pub async fn load_calibration<S: FlashStorage>(
    storage: &mut S,
    fallback: ColorProfile,
) -> ColorProfile {
    match load_calibration_inner(storage).await {
        Ok(data) => {
            info!("Loaded color calibration from flash");
            log_calibration_summary(&data.profile);
            data.profile
        }
        Err(CalibrationError::Flash(FlashError::NotFound)) => {
            debug!("No color calibration in flash, using configured table");
            fallback
        }
        Err(e) => {
            warn!("Failed to load calibration: {:?}, using configured table", e);
            fallback
        }
    }
}

/// Inner function that returns errors
async fn load_calibration_inner<S: FlashStorage>(
    storage: &mut S,
) -> Result<ColorCalibration, CalibrationError> {
    let mut buffer = [0u8; MAX_CALIBRATION_SIZE];
    let len = storage
        .read(StorageKey::ColorCalibration, &mut buffer)
        .await?;

    debug!("Read {} bytes of calibration from flash", len);

    // Deserialize with postcard
    let data: ColorCalibration =
        postcard::from_bytes(&buffer[..len]).map_err(|_| CalibrationError::Deserialize)?;

    // Validate magic and version
    if !data.is_valid() {
        return Err(CalibrationError::InvalidFormat);
    }

    // Verify CRC
    if !data.verify_crc() {
        warn!("Calibration CRC mismatch");
        return Err(CalibrationError::CrcMismatch);
    }

    Ok(data)
}

/// Save a calibrated color table to flash
pub async fn save_calibration<S: FlashStorage>(
    storage: &mut S,
    profile: &ColorProfile,
) -> Result<(), CalibrationError> {
    let data = ColorCalibration::new(profile.clone());

    // Serialize with postcard
    let mut buffer = [0u8; MAX_CALIBRATION_SIZE];
    let bytes = postcard::to_slice(&data, &mut buffer).map_err(|_| CalibrationError::Serialize)?;

    debug!("Saving {} bytes of calibration to flash", bytes.len());

    storage.write(StorageKey::ColorCalibration, bytes).await?;

    info!("Saved color calibration to flash");
    log_calibration_summary(profile);

    Ok(())
}

/// Log a summary of a color table
fn log_calibration_summary(profile: &ColorProfile) {
    debug!("Calibration: {} color(s)", profile.len());

    for (id, entry) in profile.iter() {
        let [r, g, b] = entry.reference.channels();
        trace!("  color {}: ({}, {}, {})", id.index(), r, g, b);
    }
}
