//! Line tracking
//!
//! Converts color readings into drive commands that keep the sensor on the
//! edge of a colored line, with a bounded recovery when the line is lost.

pub mod controller;
pub mod recovery;

pub use controller::{LineTarget, Steer, SteeringController};
pub use recovery::{LineRecovery, RecoveryStep};

/// Absolute value without relying on `std` float intrinsics
pub(crate) fn abs(x: f32) -> f32 {
    if x < 0.0 {
        -x
    } else {
        x
    }
}

/// Sign as -1, 0 or 1
pub(crate) fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}
