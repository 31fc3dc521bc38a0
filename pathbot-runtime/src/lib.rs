//! Pathbot runtime
//!
//! Embassy tasks that run the pathbot mission on a board, plus
//! configuration and calibration persistence.
//!
//! The tasks are generic over the sensor and actuator drivers and over the
//! `RawMutex` guarding the shared channels. A board crate wraps each one in
//! an `#[embassy_executor::task]` function with its concrete driver types:
//!
//! ```text
//! tick ──► mission ──MotionCommand──► drivetrain ──► wheels, gripper
//!             ▲                          │   ▲
//!             └──────ManeuverReport──────┘   │ Preemption
//! obstacle ──► RobotState.road_clear         │
//! emergency ─────────────────────────────────┘
//! operator ──► RobotState.desired_destination
//! mission, watchdogs ──StatusReport──► status
//! ```

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod channels;
pub mod config;
pub mod tasks;

pub use channels::{BoardChannels, Preemption, RobotChannels};
