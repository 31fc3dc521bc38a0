//! Dropped-payload watchdog task
//!
//! Polls the contact switch while a pallet is carried. On an edge it hands
//! the evasive (or restoring) maneuver to the drivetrain as a preemption
//! and waits until it has run.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker};

use pathbot_core::mission::StatusReport;
use pathbot_core::safety::{EmergencyAction, EmergencyWatchdog};
use pathbot_core::state::RobotState;
use pathbot_core::traits::Perception;

use crate::channels::{Preemption, RobotChannels};

/// Evaluate one contact reading
///
/// Returns the preemption to run, if the reading is an edge.
pub fn check(watchdog: &EmergencyWatchdog, contact: bool, state: &RobotState) -> Option<Preemption> {
    let action = watchdog.evaluate(contact, state)?;
    Some(Preemption {
        action,
        maneuvers: watchdog.maneuvers(action),
    })
}

/// Run a preemption and wait for the drivetrain to finish it
pub async fn handle<M: RawMutex>(
    watchdog: &EmergencyWatchdog,
    preemption: Preemption,
    channels: &RobotChannels<M>,
    state: &RobotState,
) {
    match preemption.action {
        EmergencyAction::Evade => {
            warn!("Payload lost, evading");
            channels.publish(StatusReport::PayloadDropped);
        }
        EmergencyAction::Restore => {
            info!("Payload back, restoring");
        }
    }

    channels.preempt_done.reset();
    channels.preempt.send(preemption).await;
    channels.preempt_done.wait().await;

    if preemption.action == EmergencyAction::Restore {
        watchdog.restored(state);
        channels.publish(StatusReport::PayloadRestored);
    }
}

/// Emergency watchdog task
pub async fn emergency_task<M: RawMutex, P: Perception>(
    watchdog: EmergencyWatchdog,
    perception: &Mutex<M, P>,
    channels: &RobotChannels<M>,
    state: &RobotState,
) {
    info!("Emergency watchdog started");

    let mut ticker = Ticker::every(Duration::from_millis(watchdog.poll_ms() as u64));

    loop {
        let contact = perception.lock().await.read_contact();
        if let Some(preemption) = check(&watchdog, contact, state) {
            handle(&watchdog, preemption, channels, state).await;
        }

        ticker.next().await;
    }
}
