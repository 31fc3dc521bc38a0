//! Proportional line-edge steering
//!
//! The error signal is the summed brightness of the reading minus the
//! midpoint between the line and the background. Turn rate is proportional
//! to it; forward speed falls off as it grows so the robot slows down on
//! the edge of the line instead of overshooting.

use super::recovery::LineRecovery;
use super::{abs, sign};
use crate::color::ColorSample;
use crate::config::SteeringConfig;
use crate::motion::DriveCommand;

/// Line to follow and the floor around it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LineTarget {
    /// Reference reading over the line
    pub line: ColorSample,
    /// Reference reading over the off-path floor
    pub background: ColorSample,
}

impl LineTarget {
    /// Create a target
    pub const fn new(line: ColorSample, background: ColorSample) -> Self {
        Self { line, background }
    }

    /// Summed brightness half way between line and background
    pub fn midpoint(&self) -> f32 {
        (self.line.sum() + self.background.sum()) as f32 / 2.0
    }

    /// Sign of the deviation when drifting onto the background
    pub fn background_sign(&self) -> f32 {
        sign((self.background.sum() - self.line.sum()) as f32)
    }
}

/// Outcome of one steering step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Steer {
    /// Keep driving with this command
    Drive(DriveCommand),
    /// Line lost, run the recovery maneuver
    Recover(LineRecovery),
}

/// Stateless line-tracking controller
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SteeringController {
    config: SteeringConfig,
}

impl SteeringController {
    /// Create a controller
    pub const fn new(config: SteeringConfig) -> Self {
        Self { config }
    }

    /// Controller tuning
    pub fn config(&self) -> &SteeringConfig {
        &self.config
    }

    /// Signed distance of the reading from the line-center reading
    pub fn deviation(&self, sample: ColorSample, target: &LineTarget) -> f32 {
        sample.sum() as f32 - target.midpoint()
    }

    /// Turn rate for a deviation
    pub fn turn_rate(&self, deviation: f32) -> f32 {
        deviation * self.config.amplifier
    }

    /// Base speed for the current payload state
    pub fn base_speed(&self, carrying_payload: bool) -> f32 {
        if carrying_payload {
            self.config.loaded_speed
        } else {
            self.config.drive_speed
        }
    }

    /// Forward speed for a deviation, never increasing with its magnitude
    pub fn speed(&self, deviation: f32, carrying_payload: bool) -> f32 {
        self.base_speed(carrying_payload)
            / (self.config.speed_floor + abs(deviation) * self.config.speed_decay)
    }

    /// Check if the deviation means the sensor has left the line for the background
    pub fn is_line_lost(&self, deviation: f32, target: &LineTarget) -> bool {
        let toward_background = target.background_sign();
        toward_background != 0.0
            && sign(deviation) == toward_background
            && abs(deviation) > self.config.lost_line_threshold
    }

    /// One tick of line tracking
    pub fn steer(
        &self,
        sample: ColorSample,
        target: &LineTarget,
        carrying_payload: bool,
        road_clear: bool,
    ) -> Steer {
        if !road_clear {
            return Steer::Drive(DriveCommand::stop());
        }

        let deviation = self.deviation(sample, target);
        if self.is_line_lost(deviation, target) {
            return Steer::Recover(LineRecovery::begin(self.turn_rate(deviation)));
        }

        Steer::Drive(DriveCommand::new(
            self.speed(deviation, carrying_payload),
            self.turn_rate(deviation),
        ))
    }

    /// Bang-bang edge following of a single color
    ///
    /// Used where only "on the color or not" is known, such as the crawl
    /// toward a pallet.
    pub fn follow_color(&self, on_color: bool, speed: f32) -> DriveCommand {
        let turn_rate = if on_color {
            self.config.follow_on_turn
        } else {
            self.config.follow_off_turn
        };
        DriveCommand::new(speed, turn_rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn yellow_on_white() -> LineTarget {
        LineTarget::new(ColorSample::new(39, 35, 10), ColorSample::new(72, 86, 100))
    }

    fn controller() -> SteeringController {
        SteeringController::new(SteeringConfig::default())
    }

    #[test]
    fn test_centered_sample_drives_straight() {
        let target = yellow_on_white();
        // Line sum 84, background sum 258, midpoint 171
        let centered = ColorSample::new(57, 57, 57);
        let steering = controller();

        assert_eq!(steering.deviation(centered, &target), 0.0);
        match steering.steer(centered, &target, false, true) {
            Steer::Drive(cmd) => {
                assert_eq!(cmd.turn_rate, 0.0);
                assert!(cmd.speed > 0.0);
            }
            Steer::Recover(_) => panic!("centered sample must not trigger recovery"),
        }
    }

    #[test]
    fn test_blocked_road_stops() {
        let target = yellow_on_white();
        let result = controller().steer(ColorSample::new(57, 57, 57), &target, false, false);
        assert_eq!(result, Steer::Drive(DriveCommand::stop()));
    }

    #[test]
    fn test_loaded_robot_is_slower() {
        let steering = controller();
        assert!(steering.speed(10.0, true) < steering.speed(10.0, false));
    }

    #[test]
    fn test_turn_sign_follows_deviation() {
        let target = yellow_on_white();
        let steering = controller();
        let brighter = steering.deviation(ColorSample::new(60, 60, 60), &target);
        let darker = steering.deviation(ColorSample::new(50, 50, 50), &target);

        assert!(steering.turn_rate(brighter) > 0.0);
        assert!(steering.turn_rate(darker) < 0.0);
    }

    #[test]
    fn test_line_lost_only_toward_background() {
        let target = yellow_on_white();
        let steering = controller();

        // Full white is far on the background side
        let on_floor = steering.steer(ColorSample::new(72, 86, 100), &target, false, true);
        assert!(matches!(on_floor, Steer::Recover(_)));

        // Equally far on the dark side is not a loss
        let dark = steering.steer(ColorSample::new(0, 0, 0), &target, false, true);
        assert!(matches!(dark, Steer::Drive(_)));
    }

    #[test]
    fn test_follow_color() {
        let steering = controller();
        let on = steering.follow_color(true, 60.0);
        let off = steering.follow_color(false, 60.0);

        assert_eq!(on, DriveCommand::new(60.0, -25.0));
        assert_eq!(off, DriveCommand::new(60.0, 45.0));
    }

    proptest! {
        #[test]
        fn prop_speed_non_increasing(a in -300.0f32..300.0, b in -300.0f32..300.0, carrying in any::<bool>()) {
            let steering = controller();
            let (small, large) = if abs(a) <= abs(b) { (a, b) } else { (b, a) };
            prop_assert!(steering.speed(large, carrying) <= steering.speed(small, carrying));
            prop_assert!(steering.speed(large, carrying) > 0.0);
        }

        #[test]
        fn prop_midpoint_sample_has_zero_turn(line in 0u16..100, background in 0u16..100) {
            // Channels chosen so the midpoint sum is a whole number
            let target = LineTarget::new(
                ColorSample::new(line, line, 0),
                ColorSample::new(background, background, 0),
            );
            let sample = ColorSample::new(line, background, 0);
            let steering = controller();
            let deviation = steering.deviation(sample, &target);
            prop_assert_eq!(deviation, 0.0);
            prop_assert_eq!(steering.turn_rate(deviation), 0.0);
        }
    }
}
