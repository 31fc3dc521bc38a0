//! Pallet acquisition
//!
//! Time-bounded crawl toward a pallet, grip on contact, and an
//! odometry-based withdrawal back to the point where the crawl started.

pub mod sequencer;

pub use sequencer::{withdrawal_distance, AcquireStep, AcquisitionOutcome, PalletSequencer};
