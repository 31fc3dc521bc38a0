//! Color calibration record
//!
//! Wraps a calibrated [`ColorProfile`] with a header so that a stored table
//! can be recognized and verified when it is loaded on boot.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::color::ColorProfile;

/// Magic number to identify valid calibration data
pub const CALIBRATION_MAGIC: u32 = 0x434F4C52; // "COLR"

/// Current calibration data version
pub const CALIBRATION_VERSION: u8 = 1;

/// Calibrated color table as stored in flash
///
/// This struct is serialized to flash using postcard.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorCalibration {
    /// Magic number for validation
    pub magic: u32,
    /// Data format version
    pub version: u8,
    /// Calibrated colors
    pub profile: ColorProfile,
    /// CRC32 checksum (calculated over magic..profile)
    pub crc: u32,
}

impl Default for ColorCalibration {
    fn default() -> Self {
        Self::new(ColorProfile::new())
    }
}

impl ColorCalibration {
    /// Wrap a profile, with the CRC already filled in
    pub fn new(profile: ColorProfile) -> Self {
        let mut data = Self {
            magic: CALIBRATION_MAGIC,
            version: CALIBRATION_VERSION,
            profile,
            crc: 0,
        };
        data.update_crc();
        data
    }

    /// Check if the header is valid (magic and version match)
    pub fn is_valid(&self) -> bool {
        self.magic == CALIBRATION_MAGIC && self.version == CALIBRATION_VERSION
    }

    /// Calculate CRC32 over the header and every entry
    pub fn calculate_crc(&self) -> u32 {
        let mut crc: u32 = 0xFFFFFFFF;

        crc = crc32_update(crc, &self.magic.to_le_bytes());
        crc = crc32_update(crc, &[self.version]);

        for (_, entry) in self.profile.iter() {
            crc = crc32_update(crc, entry.label.as_bytes());
            crc = crc32_update(crc, &[0]);
            for channel in entry.reference.channels() {
                crc = crc32_update(crc, &channel.to_le_bytes());
            }
        }

        !crc
    }

    /// Update the CRC field
    pub fn update_crc(&mut self) {
        self.crc = self.calculate_crc();
    }

    /// Verify the CRC is correct
    pub fn verify_crc(&self) -> bool {
        self.crc == self.calculate_crc()
    }
}

/// CRC32 update (IEEE 802.3 polynomial, bitwise)
fn crc32_update(crc: u32, data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB88320;
    let mut crc = crc;

    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }

    crc
}
