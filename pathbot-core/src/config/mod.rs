//! Configuration types
//!
//! Board-agnostic configuration structures. The runtime fills them from a
//! TOML file; calibration data is stored as postcard binary data.

pub mod calibration;
pub mod types;

pub use calibration::*;
pub use types::*;
