//! Safety watchdogs
//!
//! Read-evaluate-write checks that run beside the mission loop and
//! communicate only through [`RobotState`](crate::state::RobotState).

pub mod emergency;
pub mod obstacle;

pub use emergency::{EmergencyAction, EmergencyWatchdog};
pub use obstacle::ObstacleWatchdog;
