//! Shared robot state
//!
//! The one mutable state instance every task reads, with narrow accessors
//! per field and a single writer role for each.

pub mod robot;

pub use robot::{Location, RobotState};
