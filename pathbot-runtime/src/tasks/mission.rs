//! Mission task
//!
//! Runs the navigator once per control tick: takes maneuver completions,
//! samples the sensors, forwards the resulting command to the drivetrain
//! and the navigator's status reports to the operator.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;

use pathbot_core::mission::{Navigator, Readings};
use pathbot_core::motion::MotionCommand;
use pathbot_core::state::RobotState;
use pathbot_core::traits::Perception;

use crate::channels::RobotChannels;

/// Read all sensors the navigator needs for one tick
pub async fn sample<M: RawMutex, P: Perception>(perception: &Mutex<M, P>) -> Readings {
    let mut sensors = perception.lock().await;
    Readings {
        sample: sensors.read_color(),
        distance_mm: sensors.read_distance(),
        contact: sensors.read_contact(),
    }
}

/// One control period
///
/// Returns the command handed to the drivetrain, if any.
pub async fn step<M: RawMutex, P: Perception>(
    navigator: &mut Navigator,
    now_ms: u32,
    perception: &Mutex<M, P>,
    channels: &RobotChannels<M>,
    state: &RobotState,
) -> Option<MotionCommand> {
    while let Ok(report) = channels.maneuver_done.try_receive() {
        trace!("Maneuver done, odometry {} mm", report.odometry_mm);
        navigator.maneuver_complete(report);
    }

    let readings = sample(perception).await;
    trace!(
        "Tick {}: rgb=({}, {}, {}) distance={} contact={}",
        now_ms,
        readings.sample.r,
        readings.sample.g,
        readings.sample.b,
        readings.distance_mm,
        readings.contact
    );

    let phase = navigator.phase();
    let command = navigator.tick(now_ms, readings, state);
    if navigator.phase() != phase {
        info!("Mission phase: {:?}", navigator.phase());
    }

    if let Some(command) = command {
        if let MotionCommand::Maneuver(maneuver) = command {
            debug!("Maneuver: {:?}", maneuver);
        }
        // Maneuvers must not be lost, so wait for room
        channels.motion.send(command).await;
    }

    while let Some(report) = navigator.pop_report() {
        channels.publish(report);
    }

    command
}

/// Mission task - drives the navigator from the control tick
pub async fn mission_task<M: RawMutex, P: Perception>(
    mut navigator: Navigator,
    perception: &Mutex<M, P>,
    channels: &RobotChannels<M>,
    state: &RobotState,
) {
    info!("Mission task started");

    loop {
        let now_ms = channels.tick.wait().await;
        step(&mut navigator, now_ms, perception, channels, state).await;
    }
}
