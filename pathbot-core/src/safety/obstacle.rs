//! Obstacle proximity watchdog
//!
//! Sets `road_clear` from the latest distance reading. The steering loop
//! stops while the road is blocked.

use crate::config::{CarryPolicy, ObstacleConfig};
use crate::state::RobotState;

/// Obstacle watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ObstacleWatchdog {
    config: ObstacleConfig,
}

impl ObstacleWatchdog {
    /// Create a watchdog
    pub const fn new(config: ObstacleConfig) -> Self {
        Self { config }
    }

    /// Polling period in ms
    pub fn poll_ms(&self) -> u32 {
        self.config.poll_ms
    }

    /// Verdict for a reading without touching shared state
    pub fn road_clear(&self, distance_mm: u16, carrying_payload: bool) -> bool {
        let clear = distance_mm >= self.config.stop_threshold_mm;
        if !carrying_payload {
            return clear;
        }

        match self.config.carry_policy {
            CarryPolicy::AlwaysMonitor => clear,
            CarryPolicy::SuspendWhileCarrying => true,
            CarryPolicy::PresenceGated { ignore_within_mm } => {
                clear || distance_mm < ignore_within_mm
            }
        }
    }

    /// Evaluate a reading and publish the verdict
    ///
    /// Returns the new `road_clear` value.
    pub fn evaluate(&self, distance_mm: u16, state: &RobotState) -> bool {
        let clear = self.road_clear(distance_mm, state.carrying_payload());
        state.set_road_clear(clear);
        clear
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watchdog(policy: CarryPolicy) -> ObstacleWatchdog {
        ObstacleWatchdog::new(ObstacleConfig {
            stop_threshold_mm: 350,
            poll_ms: 50,
            carry_policy: policy,
        })
    }

    #[test]
    fn test_blocked_below_threshold() {
        let state = RobotState::new();
        let dog = watchdog(CarryPolicy::AlwaysMonitor);

        assert!(!dog.evaluate(349, &state));
        assert!(!state.road_clear());

        assert!(dog.evaluate(350, &state));
        assert!(state.road_clear());
    }

    #[test]
    fn test_suspended_while_carrying() {
        let state = RobotState::new();
        state.mark_payload_gripped();
        let dog = watchdog(CarryPolicy::SuspendWhileCarrying);

        assert!(dog.evaluate(10, &state));
        assert!(state.road_clear());
    }

    #[test]
    fn test_always_monitor_while_carrying() {
        let state = RobotState::new();
        state.mark_payload_gripped();
        let dog = watchdog(CarryPolicy::AlwaysMonitor);

        assert!(!dog.evaluate(10, &state));
    }

    #[test]
    fn test_presence_gated() {
        let state = RobotState::new();
        state.mark_payload_gripped();
        let dog = watchdog(CarryPolicy::PresenceGated {
            ignore_within_mm: 60,
        });

        // The pallet itself
        assert!(dog.evaluate(40, &state));
        // Something further out
        assert!(!dog.evaluate(200, &state));
        assert!(dog.evaluate(400, &state));
    }

    #[test]
    fn test_empty_robot_ignores_policy() {
        let state = RobotState::new();
        let dog = watchdog(CarryPolicy::SuspendWhileCarrying);
        assert!(!dog.evaluate(100, &state));
    }
}
