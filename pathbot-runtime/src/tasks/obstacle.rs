//! Obstacle watchdog task
//!
//! Polls the distance sensor and publishes the road-clear flag the
//! steering loop obeys.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::mutex::Mutex;
use embassy_time::{Duration, Ticker};

use pathbot_core::mission::StatusReport;
use pathbot_core::safety::ObstacleWatchdog;
use pathbot_core::state::RobotState;
use pathbot_core::traits::Perception;

use crate::channels::RobotChannels;

/// Evaluate one distance reading
///
/// Returns a status line when the road-clear flag changed.
pub fn check(watchdog: &ObstacleWatchdog, distance_mm: u16, state: &RobotState) -> Option<StatusReport> {
    let was_clear = state.road_clear();
    let clear = watchdog.evaluate(distance_mm, state);

    match (was_clear, clear) {
        (true, false) => {
            warn!("Obstacle at {} mm, stopping", distance_mm);
            Some(StatusReport::ObstacleAhead)
        }
        (false, true) => {
            info!("Road clear");
            Some(StatusReport::RoadClear)
        }
        _ => None,
    }
}

/// Obstacle watchdog task
pub async fn obstacle_task<M: RawMutex, P: Perception>(
    watchdog: ObstacleWatchdog,
    perception: &Mutex<M, P>,
    channels: &RobotChannels<M>,
    state: &RobotState,
) {
    info!("Obstacle watchdog started");

    let mut ticker = Ticker::every(Duration::from_millis(watchdog.poll_ms() as u64));

    loop {
        let distance_mm = perception.lock().await.read_distance();
        if let Some(report) = check(&watchdog, distance_mm, state) {
            channels.publish(report);
        }

        ticker.next().await;
    }
}
