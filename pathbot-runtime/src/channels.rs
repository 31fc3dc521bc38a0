//! Inter-task communication channels
//!
//! One [`RobotChannels`] instance connects all tasks. Boards declare it as a
//! static with [`BoardChannels`]; host tests use any other `RawMutex`.

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;

use pathbot_core::mission::StatusReport;
use pathbot_core::motion::{Maneuver, ManeuverReport, MotionCommand};
use pathbot_core::safety::EmergencyAction;

/// Channel capacity for mission motion commands
const MOTION_CHANNEL_SIZE: usize = 4;

/// Channel capacity for maneuver completion reports
const REPORT_CHANNEL_SIZE: usize = 4;

/// Channel capacity for emergency preemptions
const PREEMPT_CHANNEL_SIZE: usize = 2;

/// Channel capacity for operator status lines
const STATUS_CHANNEL_SIZE: usize = 8;

/// Emergency maneuver that takes the drivetrain away from the mission
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Preemption {
    /// Watchdog action this executes
    pub action: EmergencyAction,
    /// Maneuvers in execution order
    pub maneuvers: [Maneuver; 3],
}

/// Channels and signals shared by the robot's tasks
pub struct RobotChannels<M: RawMutex> {
    /// Mission to drivetrain
    pub motion: Channel<M, MotionCommand, MOTION_CHANNEL_SIZE>,
    /// Drivetrain to mission, one per executed mission maneuver
    pub maneuver_done: Channel<M, ManeuverReport, REPORT_CHANNEL_SIZE>,
    /// Emergency watchdog to drivetrain, served before `motion`
    pub preempt: Channel<M, Preemption, PREEMPT_CHANNEL_SIZE>,
    /// Drivetrain to emergency watchdog once a preemption has run
    pub preempt_done: Signal<M, ()>,
    /// Status lines for the operator
    pub status: Channel<M, StatusReport, STATUS_CHANNEL_SIZE>,
    /// Control tick timestamp in ms
    pub tick: Signal<M, u32>,
}

/// Channels as declared by a board
pub type BoardChannels = RobotChannels<CriticalSectionRawMutex>;

impl<M: RawMutex> RobotChannels<M> {
    /// Create empty channels
    pub const fn new() -> Self {
        Self {
            motion: Channel::new(),
            maneuver_done: Channel::new(),
            preempt: Channel::new(),
            preempt_done: Signal::new(),
            status: Channel::new(),
            tick: Signal::new(),
        }
    }

    /// Queue a status line, dropping it if the operator link is backed up
    pub fn publish(&self, report: StatusReport) {
        if self.status.try_send(report).is_err() {
            warn!("Status channel full, dropping report");
        }
    }
}

impl<M: RawMutex> Default for RobotChannels<M> {
    fn default() -> Self {
        Self::new()
    }
}
