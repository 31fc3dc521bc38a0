//! Raw color sensor readings

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One reading of the color sensor's red, green and blue channels
///
/// Values are reflected intensities as reported by the sensor driver
/// (0-100 on the reference sensor, but nothing here assumes that range).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorSample {
    /// Red channel intensity
    pub r: u16,
    /// Green channel intensity
    pub g: u16,
    /// Blue channel intensity
    pub b: u16,
}

impl ColorSample {
    /// Create a sample from its three channels
    pub const fn new(r: u16, g: u16, b: u16) -> Self {
        Self { r, g, b }
    }

    /// Channels in red, green, blue order
    pub const fn channels(&self) -> [u16; 3] {
        [self.r, self.g, self.b]
    }

    /// Sum of all three channels
    ///
    /// Used by the steering loop as a single brightness figure.
    pub const fn sum(&self) -> i32 {
        self.r as i32 + self.g as i32 + self.b as i32
    }
}

impl From<(u16, u16, u16)> for ColorSample {
    fn from((r, g, b): (u16, u16, u16)) -> Self {
        Self { r, g, b }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum() {
        assert_eq!(ColorSample::new(72, 86, 100).sum(), 258);
        assert_eq!(ColorSample::default().sum(), 0);
    }

    #[test]
    fn test_from_tuple() {
        let sample: ColorSample = (68, 23, 40).into();
        assert_eq!(sample.channels(), [68, 23, 40]);
    }
}
