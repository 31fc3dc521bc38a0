//! Drive and maneuver commands

/// Continuous drive command, issued once per control tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveCommand {
    /// Forward speed in mm/s
    pub speed: f32,
    /// Turn rate in deg/s (positive turns right)
    pub turn_rate: f32,
}

impl DriveCommand {
    /// Full stop
    pub const fn stop() -> Self {
        Self {
            speed: 0.0,
            turn_rate: 0.0,
        }
    }

    /// Drive at `speed` with turn rate `turn_rate`
    pub const fn new(speed: f32, turn_rate: f32) -> Self {
        Self { speed, turn_rate }
    }

    /// Check if this is the zero command
    pub fn is_stop(&self) -> bool {
        self.speed == 0.0 && self.turn_rate == 0.0
    }
}

/// Discrete motion that runs to completion before the next command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Maneuver {
    /// Stop the drivetrain
    Halt,
    /// Turn in place by the given angle in degrees (positive turns right)
    Turn { degrees: f32 },
    /// Drive straight by the given distance in mm (negative reverses)
    Straight { mm: f32 },
    /// Zero the drivetrain odometry
    ResetOdometry,
    /// Declare the gripper's current position to be `angle`
    GripperReset { angle: i32 },
    /// Run the gripper to `angle` at `speed` deg/s
    GripperToAngle { speed: i32, angle: i32 },
    /// Run the gripper at `speed` deg/s until it stalls
    GripperUntilStalled { speed: i32 },
}

/// Anything the mission can ask of the drivetrain
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MotionCommand {
    /// Continuous drive, superseded by the next command
    Drive(DriveCommand),
    /// Discrete maneuver, acknowledged with a [`ManeuverReport`]
    Maneuver(Maneuver),
}

/// Completion notice for a maneuver
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ManeuverReport {
    /// Maneuver that finished
    pub maneuver: Maneuver,
    /// Odometry reading in mm taken after the maneuver
    pub odometry_mm: f32,
}

impl ManeuverReport {
    /// Create a report
    pub const fn new(maneuver: Maneuver, odometry_mm: f32) -> Self {
        Self {
            maneuver,
            odometry_mm,
        }
    }
}
