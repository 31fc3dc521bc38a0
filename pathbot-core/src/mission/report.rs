//! Operator-visible status messages

use core::fmt;

use super::phase::MissionPhase;
use crate::color::ColorLabel;

/// Status line for the operator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StatusReport {
    /// Navigator entered a new phase
    PhaseChanged(MissionPhase),
    /// Circling the hub with no destination chosen
    AwaitingDestination,
    /// Drove past a path that is not the destination
    DestinationSkipped(ColorLabel),
    /// Line lost, recovery maneuver started
    LineLost,
    /// Pallet gripped
    PalletGripped,
    /// No pallet contact within the time budget
    AcquisitionFailed,
    /// Pallet put down in the delivery zone
    PayloadDelivered,
    /// Pallet fell off, evading
    PayloadDropped,
    /// Pallet back on the gripper, resuming
    PayloadRestored,
    /// Obstacle closer than the stop distance
    ObstacleAhead,
    /// Obstacle gone
    RoadClear,
    /// Operator entered a label that is not calibrated
    UnknownColor,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusReport::PhaseChanged(phase) => write!(f, "Now {}", phase),
            StatusReport::AwaitingDestination => f.write_str("Select a destination color"),
            StatusReport::DestinationSkipped(label) => write!(f, "Skipping {}", label.as_str()),
            StatusReport::LineLost => f.write_str("Line lost, searching"),
            StatusReport::PalletGripped => f.write_str("Picking up the found pallet"),
            StatusReport::AcquisitionFailed => f.write_str("Picking up failed"),
            StatusReport::PayloadDelivered => f.write_str("Pallet delivered"),
            StatusReport::PayloadDropped => f.write_str("Pallet dropped, evading"),
            StatusReport::PayloadRestored => f.write_str("Pallet back on, resuming"),
            StatusReport::ObstacleAhead => f.write_str("Obstacle ahead, stopped"),
            StatusReport::RoadClear => f.write_str("Road clear"),
            StatusReport::UnknownColor => f.write_str("No color matching input"),
        }
    }
}
