//! Pathbot hardware abstraction layer
//!
//! Traits a board support crate implements so the runtime can persist
//! robot configuration and color calibration without knowing the chip.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  pathbot-runtime (tasks, persistence)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  pathbot-hal (this crate - traits)      │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  board crate (flash driver)             │
//! └─────────────────────────────────────────┘
//! ```
//!
//! Sensor and actuator drivers are described by the traits in
//! `pathbot_core::traits`, since the control logic consumes them directly.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod flash;

pub use flash::{FlashError, FlashStorage, StorageKey};
