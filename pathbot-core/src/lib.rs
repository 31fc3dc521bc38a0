//! Board-agnostic core logic for the pathbot line-following pallet robot
//!
//! This crate contains all navigation and manipulation logic that does not
//! depend on specific hardware implementations:
//!
//! - Color classification against a calibrated reference table
//! - Line-tracking steering with lost-line recovery
//! - Mission navigator (path selection, travel, pallet search, return)
//! - Pallet acquisition sequencer
//! - Safety watchdog logic (obstacle stop, dropped payload)
//! - Shared robot state
//! - Driver traits and configuration types

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod acquisition;
pub mod color;
pub mod config;
pub mod mission;
pub mod motion;
pub mod safety;
pub mod state;
pub mod steering;
pub mod traits;
