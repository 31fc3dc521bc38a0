//! Motion command types
//!
//! These types define the command/report interface between the mission
//! logic, the safety watchdogs and the task that owns the drivetrain.

pub mod command;

pub use command::{DriveCommand, Maneuver, ManeuverReport, MotionCommand};
