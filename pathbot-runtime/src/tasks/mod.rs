//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod drivetrain;
pub mod emergency;
pub mod mission;
pub mod obstacle;
pub mod operator;
pub mod tick;

pub use drivetrain::{drivetrain_task, MotionHardware};
pub use emergency::emergency_task;
pub use mission::mission_task;
pub use obstacle::obstacle_task;
pub use operator::{operator_task, status_task};
pub use tick::tick_task;
