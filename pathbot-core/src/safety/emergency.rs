//! Dropped-payload watchdog
//!
//! Edge-triggered on the contact switch while a pallet is carried: losing
//! contact enters emergency mode once, regaining it asks for the evasive
//! maneuver to be undone. Emergency mode is left when the undo maneuver has
//! been executed.

use crate::config::EmergencyConfig;
use crate::motion::Maneuver;
use crate::state::RobotState;

/// Action requested by the watchdog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EmergencyAction {
    /// Payload lost: turn away, retreat and hold
    Evade,
    /// Payload back in the gripper: undo the evasive maneuver
    Restore,
}

/// Emergency watchdog
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EmergencyWatchdog {
    config: EmergencyConfig,
}

impl EmergencyWatchdog {
    /// Create a watchdog
    pub const fn new(config: EmergencyConfig) -> Self {
        Self { config }
    }

    /// Polling period in ms
    pub fn poll_ms(&self) -> u32 {
        self.config.poll_ms
    }

    /// Evaluate one contact reading
    ///
    /// Enters emergency mode on the first reading without contact while
    /// carrying; later readings without contact return `None`.
    pub fn evaluate(&self, contact: bool, state: &RobotState) -> Option<EmergencyAction> {
        let active = state.emergency_active();

        if !active && state.carrying_payload() && !contact {
            state.set_emergency_active(true);
            return Some(EmergencyAction::Evade);
        }

        if active && contact {
            return Some(EmergencyAction::Restore);
        }

        None
    }

    /// Maneuvers for an action, in execution order
    pub fn maneuvers(&self, action: EmergencyAction) -> [Maneuver; 3] {
        match action {
            EmergencyAction::Evade => [
                Maneuver::Halt,
                Maneuver::Turn {
                    degrees: self.config.evade_turn_deg,
                },
                Maneuver::Straight {
                    mm: -self.config.retreat_mm,
                },
            ],
            EmergencyAction::Restore => [
                Maneuver::Straight {
                    mm: self.config.retreat_mm,
                },
                Maneuver::Turn {
                    degrees: -self.config.evade_turn_deg,
                },
                Maneuver::Halt,
            ],
        }
    }

    /// Leave emergency mode once the restore maneuver is done
    pub fn restored(&self, state: &RobotState) {
        state.set_emergency_active(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watchdog() -> EmergencyWatchdog {
        EmergencyWatchdog::new(EmergencyConfig::default())
    }

    #[test]
    fn test_no_payload_no_emergency() {
        let state = RobotState::new();
        assert_eq!(watchdog().evaluate(false, &state), None);
        assert!(!state.emergency_active());
    }

    #[test]
    fn test_edge_triggered_evade() {
        let state = RobotState::new();
        state.mark_payload_gripped();
        let dog = watchdog();

        assert_eq!(dog.evaluate(true, &state), None);
        assert_eq!(dog.evaluate(false, &state), Some(EmergencyAction::Evade));
        assert!(state.emergency_active());

        // Contact still missing: no second evade
        assert_eq!(dog.evaluate(false, &state), None);
        assert_eq!(dog.evaluate(false, &state), None);
    }

    #[test]
    fn test_restore_and_clear() {
        let state = RobotState::new();
        state.mark_payload_gripped();
        let dog = watchdog();

        dog.evaluate(false, &state);
        assert_eq!(dog.evaluate(true, &state), Some(EmergencyAction::Restore));
        assert!(state.emergency_active());

        dog.restored(&state);
        assert!(!state.emergency_active());
        assert_eq!(dog.evaluate(true, &state), None);
    }

    #[test]
    fn test_restore_undoes_evade() {
        let dog = watchdog();
        let evade = dog.maneuvers(EmergencyAction::Evade);
        let restore = dog.maneuvers(EmergencyAction::Restore);

        assert_eq!(evade[1], Maneuver::Turn { degrees: 90.0 });
        assert_eq!(evade[2], Maneuver::Straight { mm: -100.0 });
        assert_eq!(restore[0], Maneuver::Straight { mm: 100.0 });
        assert_eq!(restore[1], Maneuver::Turn { degrees: -90.0 });
    }
}
