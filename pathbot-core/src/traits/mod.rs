//! Hardware abstraction traits
//!
//! These traits define the interface between the application logic
//! and hardware-specific implementations.

pub mod actuation;
pub mod perception;

pub use actuation::{Drivetrain, RotaryActuator};
pub use perception::Perception;
