//! Pallet acquisition sequencer
//!
//! The sequence is:
//!
//! 1. Reset odometry and declare the gripper at its zero angle
//! 2. Crawl forward in single-color follow mode, polling the contact switch
//! 3. Contact before the time budget runs out grips the pallet;
//!    otherwise the attempt fails and the gripper is left alone
//! 4. Either way, reverse the odometry distance times the slot multiplier
//!
//! The sequencer is tick-driven: the caller feeds it timestamps and sensor
//! readings and executes the maneuvers it hands out.

use crate::config::{AcquisitionConfig, GripMode};
use crate::motion::{DriveCommand, Maneuver};
use crate::state::RobotState;
use crate::steering::SteeringController;

/// Result of one acquisition attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquisitionOutcome {
    /// Contact made in time, pallet gripped
    Gripped,
    /// No contact within the time budget
    TimedOut,
}

impl AcquisitionOutcome {
    /// Check if the pallet was gripped
    pub fn is_success(&self) -> bool {
        matches!(self, AcquisitionOutcome::Gripped)
    }
}

/// Output of one crawl tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AcquireStep {
    /// Keep crawling with this command
    Crawl(DriveCommand),
    /// Crawl over
    Finished(AcquisitionOutcome),
}

/// Distance to reverse after a crawl of `traveled_mm`
pub fn withdrawal_distance(traveled_mm: f32, multiplier: u8) -> f32 {
    traveled_mm * multiplier as f32
}

/// Bounded-time crawl-and-grip sequencer
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PalletSequencer {
    config: AcquisitionConfig,
    grip: GripMode,
    started_ms: Option<u32>,
    outcome: Option<AcquisitionOutcome>,
}

impl PalletSequencer {
    /// Create a sequencer gripping with `grip`
    pub const fn new(config: AcquisitionConfig, grip: GripMode) -> Self {
        Self {
            config,
            grip,
            started_ms: None,
            outcome: None,
        }
    }

    /// Maneuvers that put odometry and gripper in a known state
    pub fn preparation(&self) -> [Maneuver; 2] {
        [
            Maneuver::ResetOdometry,
            Maneuver::GripperReset {
                angle: self.config.gripper_zero_angle,
            },
        ]
    }

    /// One crawl tick, the first one starts the crawl clock
    ///
    /// `on_line` tells whether the sensor is over the followed boundary color.
    pub fn tick(
        &mut self,
        now_ms: u32,
        contact: bool,
        on_line: bool,
        steering: &SteeringController,
    ) -> AcquireStep {
        if let Some(outcome) = self.outcome {
            return AcquireStep::Finished(outcome);
        }

        let started = *self.started_ms.get_or_insert(now_ms);
        let elapsed = now_ms.wrapping_sub(started);

        let outcome = if contact && elapsed < self.config.timeout_ms {
            AcquisitionOutcome::Gripped
        } else if elapsed >= self.config.timeout_ms {
            AcquisitionOutcome::TimedOut
        } else {
            return AcquireStep::Crawl(steering.follow_color(on_line, self.config.crawl_speed));
        };

        self.outcome = Some(outcome);
        AcquireStep::Finished(outcome)
    }

    /// Gripper motion for a successful attempt
    pub fn grip_maneuver(&self) -> Maneuver {
        match self.grip {
            GripMode::ToAngle { speed, angle } => Maneuver::GripperToAngle { speed, angle },
            GripMode::UntilStalled { speed } => Maneuver::GripperUntilStalled { speed },
        }
    }

    /// Reverse move back to the crawl's starting point
    pub fn withdrawal(&self, traveled_mm: f32, multiplier: u8) -> Maneuver {
        Maneuver::Straight {
            mm: -withdrawal_distance(traveled_mm, multiplier),
        }
    }

    /// Publish the outcome: a gripped pallet is now carried
    pub fn complete(&self, outcome: AcquisitionOutcome, state: &RobotState) {
        if outcome.is_success() {
            state.mark_payload_gripped();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SteeringConfig;

    fn sequencer() -> PalletSequencer {
        PalletSequencer::new(AcquisitionConfig::default(), GripMode::default())
    }

    fn steering() -> SteeringController {
        SteeringController::new(SteeringConfig::default())
    }

    /// Run ticks every 20 ms with contact from `contact_at_ms` on
    fn run(contact_at_ms: Option<u32>) -> (AcquisitionOutcome, u32) {
        let mut seq = sequencer();
        let steering = steering();

        let mut now = 1000;
        loop {
            let contact = contact_at_ms.map_or(false, |t| now - 1000 >= t);
            if let AcquireStep::Finished(outcome) = seq.tick(now, contact, true, &steering) {
                return (outcome, now - 1000);
            }
            now += 20;
        }
    }

    #[test]
    fn test_contact_before_timeout_grips() {
        let (outcome, at) = run(Some(2000));
        assert_eq!(outcome, AcquisitionOutcome::Gripped);
        assert_eq!(at, 2000);
    }

    #[test]
    fn test_contact_just_before_timeout_grips() {
        let (outcome, _) = run(Some(5980));
        assert_eq!(outcome, AcquisitionOutcome::Gripped);
    }

    #[test]
    fn test_no_contact_times_out() {
        let (outcome, at) = run(None);
        assert_eq!(outcome, AcquisitionOutcome::TimedOut);
        assert_eq!(at, 6000);
    }

    #[test]
    fn test_crawl_uses_follow_mode() {
        let mut seq = sequencer();
        let steering = steering();

        assert_eq!(
            seq.tick(20, false, true, &steering),
            AcquireStep::Crawl(DriveCommand::new(60.0, -25.0))
        );
        assert_eq!(
            seq.tick(40, false, false, &steering),
            AcquireStep::Crawl(DriveCommand::new(60.0, 45.0))
        );
    }

    #[test]
    fn test_clock_starts_on_first_tick() {
        let mut seq = sequencer();
        let steering = steering();

        assert!(matches!(seq.tick(5000, false, true, &steering), AcquireStep::Crawl(_)));
        assert!(matches!(seq.tick(10_980, false, true, &steering), AcquireStep::Crawl(_)));
        assert_eq!(
            seq.tick(11_000, false, true, &steering),
            AcquireStep::Finished(AcquisitionOutcome::TimedOut)
        );
    }

    #[test]
    fn test_timeout_across_timestamp_wrap() {
        let mut seq = sequencer();
        let steering = steering();
        let first = u32::MAX - 1000;

        seq.tick(first, false, true, &steering);
        assert!(matches!(
            seq.tick(first.wrapping_add(5980), false, true, &steering),
            AcquireStep::Crawl(_)
        ));
        assert_eq!(
            seq.tick(first.wrapping_add(6000), false, true, &steering),
            AcquireStep::Finished(AcquisitionOutcome::TimedOut)
        );
    }

    #[test]
    fn test_finished_is_sticky() {
        let mut seq = sequencer();
        let steering = steering();
        seq.tick(10, true, true, &steering);

        // A later tick without contact does not change the outcome
        assert_eq!(
            seq.tick(10_000, false, true, &steering),
            AcquireStep::Finished(AcquisitionOutcome::Gripped)
        );
    }

    #[test]
    fn test_complete_sets_payload_only_on_success() {
        let seq = sequencer();
        let state = RobotState::new();

        seq.complete(AcquisitionOutcome::TimedOut, &state);
        assert!(!state.carrying_payload());

        seq.complete(AcquisitionOutcome::Gripped, &state);
        assert!(state.carrying_payload());
    }

    #[test]
    fn test_withdrawal_scales_with_multiplier() {
        let seq = sequencer();
        assert_eq!(seq.withdrawal(120.0, 1), Maneuver::Straight { mm: -120.0 });
        assert_eq!(seq.withdrawal(120.0, 2), Maneuver::Straight { mm: -240.0 });
        assert_eq!(withdrawal_distance(0.0, 2), 0.0);
    }

    #[test]
    fn test_grip_maneuver() {
        let seq = PalletSequencer::new(
            AcquisitionConfig::default(),
            GripMode::UntilStalled { speed: -200 },
        );
        assert_eq!(
            seq.grip_maneuver(),
            Maneuver::GripperUntilStalled { speed: -200 }
        );
        assert_eq!(
            seq.preparation(),
            [Maneuver::ResetOdometry, Maneuver::GripperReset { angle: 0 }]
        );
    }
}
