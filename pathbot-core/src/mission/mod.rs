//! Mission navigation
//!
//! The navigator cycles through path selection, travel, pallet search and
//! the return to the hub, forever. It is driven by a periodic tick and
//! talks to the drivetrain only through [`crate::motion::MotionCommand`]s.

pub mod navigator;
pub mod phase;
pub mod report;

pub use navigator::{Navigator, NavigatorError, Readings};
pub use phase::{Event, MissionPhase};
pub use report::StatusReport;
