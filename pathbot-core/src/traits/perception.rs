//! Sensor trait

use crate::color::ColorSample;

/// Sensors the mission and watchdogs read
///
/// Takes `&mut self` because sensor reads typically require mutable access
/// to the bus they sit on.
pub trait Perception {
    /// Read the color sensor's red, green and blue channels
    fn read_color(&mut self) -> ColorSample;

    /// Read the forward distance sensor in mm
    fn read_distance(&mut self) -> u16;

    /// Check if the payload contact switch is pressed
    fn read_contact(&mut self) -> bool;
}
