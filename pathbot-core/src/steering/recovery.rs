//! Lost-line recovery
//!
//! A small rotation toward the line is tried first. If the re-sampled
//! reading is still lost and the robot is not over the phase's boundary
//! color, a wider rotation plus a short reverse follows. Tracking resumes
//! on the next tick either way, so recovery never loops.

use crate::config::SteeringConfig;
use crate::motion::Maneuver;

/// What to do after the first recovery rotation
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RecoveryStep {
    /// Line found again (or boundary reached), resume tracking
    Resume,
    /// Still lost: rotate wider, then back off
    Retreat([Maneuver; 2]),
}

/// Recovery in progress
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineRecovery {
    /// Rotation direction toward the line (+1 right, -1 left)
    toward_line: f32,
}

impl LineRecovery {
    /// Start a recovery for a lost line
    ///
    /// `turn_rate` is the rate the tracker would have commanded; its sign
    /// points toward the line.
    pub fn begin(turn_rate: f32) -> Self {
        let toward_line = if turn_rate < 0.0 { -1.0 } else { 1.0 };
        Self { toward_line }
    }

    /// First, small rotation toward the line
    pub fn first_rotation(&self, config: &SteeringConfig) -> Maneuver {
        Maneuver::Turn {
            degrees: self.toward_line * config.recovery_turn_deg,
        }
    }

    /// Decide the follow-up once the sensor has been re-sampled
    pub fn after_rotation(
        &self,
        still_lost: bool,
        over_boundary: bool,
        config: &SteeringConfig,
    ) -> RecoveryStep {
        if !still_lost || over_boundary {
            return RecoveryStep::Resume;
        }

        RecoveryStep::Retreat([
            Maneuver::Turn {
                degrees: self.toward_line * config.recovery_wide_turn_deg,
            },
            Maneuver::Straight {
                mm: -config.recovery_reverse_mm,
            },
        ])
    }
}
