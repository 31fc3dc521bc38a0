//! Actuator traits
//!
//! Discrete moves return futures that resolve once the motion is complete,
//! so a caller can await a turn without blocking other tasks.

use core::future::Future;

/// Differential drivetrain with odometry
pub trait Drivetrain {
    /// Drive continuously at `speed` mm/s while turning at `turn_rate` deg/s
    fn drive(&mut self, speed: f32, turn_rate: f32);

    /// Stop driving
    fn stop(&mut self) {
        self.drive(0.0, 0.0);
    }

    /// Turn in place by `degrees` and wait for the turn to finish
    fn turn(&mut self, degrees: f32) -> impl Future<Output = ()>;

    /// Drive straight by `mm` (negative reverses) and wait for the move to finish
    fn straight(&mut self, mm: f32) -> impl Future<Output = ()>;

    /// Zero the distance counter
    fn reset_odometry(&mut self);

    /// Distance driven in mm since the last reset
    fn distance_traveled(&mut self) -> f32;
}

/// Rotary actuator driving the gripper
pub trait RotaryActuator {
    /// Run to `angle` degrees at `speed` deg/s and wait for arrival
    fn run_to_angle(&mut self, speed: i32, angle: i32) -> impl Future<Output = ()>;

    /// Run at `speed` deg/s until mechanically stalled
    ///
    /// Resolves with the angle at which the actuator stalled.
    fn run_until_stalled(&mut self, speed: i32) -> impl Future<Output = i32>;

    /// Declare the current position to be `angle` degrees
    fn reset_angle(&mut self, angle: i32);
}
