//! Drivetrain task
//!
//! The only task holding the wheel and gripper drivers. Emergency
//! preemptions are served before mission commands. While an emergency
//! holds the drivetrain, drive commands are dropped and a mission maneuver
//! is held back. The hold ends once the restore maneuver has run or the
//! emergency flag is cleared, whichever is seen first, and the held
//! maneuver then runs before anything else.

use embassy_futures::select::{select, Either};
use embassy_sync::blocking_mutex::raw::RawMutex;

use pathbot_core::motion::{DriveCommand, Maneuver, ManeuverReport, MotionCommand};
use pathbot_core::safety::EmergencyAction;
use pathbot_core::state::RobotState;
use pathbot_core::traits::{Drivetrain, RotaryActuator};

use crate::channels::{Preemption, RobotChannels};

/// Exclusive owner of the motion hardware
pub struct MotionHardware<D, G> {
    drivetrain: D,
    gripper: G,
}

impl<D: Drivetrain, G: RotaryActuator> MotionHardware<D, G> {
    /// Take ownership of the drivers
    pub fn new(drivetrain: D, gripper: G) -> Self {
        Self {
            drivetrain,
            gripper,
        }
    }

    /// Release the drivers
    pub fn into_parts(self) -> (D, G) {
        (self.drivetrain, self.gripper)
    }

    /// Apply a continuous drive command
    pub fn drive(&mut self, command: DriveCommand) {
        trace!("Drive: {} mm/s, {} deg/s", command.speed, command.turn_rate);
        self.drivetrain.drive(command.speed, command.turn_rate);
    }

    /// Run a maneuver to completion and report the odometry afterwards
    pub async fn execute(&mut self, maneuver: Maneuver) -> ManeuverReport {
        match maneuver {
            Maneuver::Halt => self.drivetrain.stop(),
            Maneuver::Turn { degrees } => self.drivetrain.turn(degrees).await,
            Maneuver::Straight { mm } => self.drivetrain.straight(mm).await,
            Maneuver::ResetOdometry => self.drivetrain.reset_odometry(),
            Maneuver::GripperReset { angle } => self.gripper.reset_angle(angle),
            Maneuver::GripperToAngle { speed, angle } => {
                self.gripper.run_to_angle(speed, angle).await
            }
            Maneuver::GripperUntilStalled { speed } => {
                let angle = self.gripper.run_until_stalled(speed).await;
                debug!("Gripper stalled at {} deg", angle);
            }
        }

        ManeuverReport::new(maneuver, self.drivetrain.distance_traveled())
    }

    /// Run an emergency preemption
    pub async fn preempt(&mut self, preemption: &Preemption) {
        for maneuver in preemption.maneuvers {
            self.execute(maneuver).await;
        }
    }
}

/// Drivetrain task - executes motion commands from the mission and watchdogs
pub async fn drivetrain_task<M, D, G>(
    mut hardware: MotionHardware<D, G>,
    channels: &RobotChannels<M>,
    state: &RobotState,
) where
    M: RawMutex,
    D: Drivetrain,
    G: RotaryActuator,
{
    info!("Drivetrain task started");

    let mut deferred: Option<Maneuver> = None;
    // Last preemption served since the emergency flag was raised
    let mut last_action: Option<EmergencyAction> = None;

    loop {
        let command = match select(channels.preempt.receive(), channels.motion.receive()).await {
            Either::First(preemption) => {
                info!("Preempted by emergency: {:?}", preemption.action);
                hardware.preempt(&preemption).await;
                last_action = Some(preemption.action);
                channels.preempt_done.signal(());
                None
            }
            Either::Second(command) => Some(command),
        };

        if !state.emergency_active() {
            last_action = None;
        }
        let held = is_held(state, last_action);
        if !held {
            if let Some(maneuver) = deferred.take() {
                debug!("Resuming deferred maneuver: {:?}", maneuver);
                run_mission_maneuver(&mut hardware, maneuver, channels).await;
            }
        }

        match command {
            Some(MotionCommand::Drive(_)) if held => {
                trace!("Emergency active, ignoring drive command");
            }
            Some(MotionCommand::Drive(command)) => hardware.drive(command),
            Some(MotionCommand::Maneuver(maneuver)) if held => {
                debug!("Emergency active, deferring {:?}", maneuver);
                deferred = Some(maneuver);
            }
            Some(MotionCommand::Maneuver(maneuver)) => {
                run_mission_maneuver(&mut hardware, maneuver, channels).await;
            }
            None => {}
        }
    }
}

/// Check if the emergency still owns the drivetrain
///
/// The watchdog clears its flag only after the restore maneuver has been
/// acknowledged, so a served restore already ends the hold.
fn is_held(state: &RobotState, last_action: Option<EmergencyAction>) -> bool {
    state.emergency_active() && last_action != Some(EmergencyAction::Restore)
}

async fn run_mission_maneuver<M, D, G>(
    hardware: &mut MotionHardware<D, G>,
    maneuver: Maneuver,
    channels: &RobotChannels<M>,
) where
    M: RawMutex,
    D: Drivetrain,
    G: RotaryActuator,
{
    let report = hardware.execute(maneuver).await;
    channels.maneuver_done.send(report).await;
}


#[cfg(test)]
mod tests {
    use super::mock::{MockDrivetrain, MockGripper};
    use super::*;
    use core::cell::RefCell;
    use embassy_futures::block_on;
    use embassy_futures::select::select;
    use embassy_futures::yield_now;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use pathbot_core::config::EmergencyConfig;
    use pathbot_core::safety::EmergencyWatchdog;

    use crate::tasks::emergency::{check, handle};

    fn hardware() -> MotionHardware<MockDrivetrain, MockGripper> {
        MotionHardware::new(MockDrivetrain::default(), MockGripper::default())
    }

    /// Drivetrain whose call log outlives the task that owns it
    struct SharedDrivetrain<'a> {
        calls: &'a RefCell<Vec<String>>,
        odometry_mm: f32,
    }

    impl Drivetrain for SharedDrivetrain<'_> {
        fn drive(&mut self, speed: f32, turn_rate: f32) {
            self.calls
                .borrow_mut()
                .push(format!("drive {} {}", speed, turn_rate));
        }

        async fn turn(&mut self, degrees: f32) {
            self.calls.borrow_mut().push(format!("turn {}", degrees));
        }

        async fn straight(&mut self, mm: f32) {
            self.calls.borrow_mut().push(format!("straight {}", mm));
            self.odometry_mm += mm;
        }

        fn reset_odometry(&mut self) {
            self.calls.borrow_mut().push("reset".into());
            self.odometry_mm = 0.0;
        }

        fn distance_traveled(&mut self) -> f32 {
            self.odometry_mm
        }
    }

    /// Let the drivetrain task drain the motion channel
    async fn settle<M: RawMutex>(channels: &RobotChannels<M>) {
        while !channels.motion.is_empty() {
            yield_now().await;
        }
    }

    #[test]
    fn test_execute_reports_odometry() {
        let mut hw = hardware();

        block_on(hw.execute(Maneuver::ResetOdometry));
        let report = block_on(hw.execute(Maneuver::Straight { mm: 120.0 }));
        assert_eq!(report.maneuver, Maneuver::Straight { mm: 120.0 });
        assert_eq!(report.odometry_mm, 120.0);

        let report = block_on(hw.execute(Maneuver::Halt));
        assert_eq!(report.odometry_mm, 120.0);

        let (drivetrain, _) = hw.into_parts();
        assert_eq!(drivetrain.calls, ["reset", "straight 120", "drive 0 0"]);
    }

    #[test]
    fn test_gripper_maneuvers() {
        let mut hw = hardware();

        block_on(hw.execute(Maneuver::GripperReset { angle: 0 }));
        block_on(hw.execute(Maneuver::GripperToAngle {
            speed: 200,
            angle: -50,
        }));
        block_on(hw.execute(Maneuver::GripperUntilStalled { speed: -200 }));

        let (_, gripper) = hw.into_parts();
        assert_eq!(gripper.calls, ["zero 0", "to 200 -50", "stall -200"]);
        assert_eq!(gripper.angle, -55);
    }

    #[test]
    fn test_preemption_runs_all_maneuvers() {
        let mut hw = hardware();
        let watchdog = EmergencyWatchdog::new(EmergencyConfig::default());
        let preemption = Preemption {
            action: EmergencyAction::Evade,
            maneuvers: watchdog.maneuvers(EmergencyAction::Evade),
        };

        block_on(hw.preempt(&preemption));

        let (drivetrain, _) = hw.into_parts();
        assert_eq!(drivetrain.calls, ["drive 0 0", "turn 90", "straight -100"]);
    }

    #[test]
    fn test_emergency_holds_mission_until_restored() {
        let calls = RefCell::new(Vec::new());
        let hw = MotionHardware::new(
            SharedDrivetrain {
                calls: &calls,
                odometry_mm: 0.0,
            },
            MockGripper::default(),
        );
        let channels: RobotChannels<NoopRawMutex> = RobotChannels::new();
        let state = RobotState::new();
        let watchdog = EmergencyWatchdog::new(EmergencyConfig::default());
        state.mark_payload_gripped();

        let script = async {
            let evade = check(&watchdog, false, &state).unwrap();
            handle(&watchdog, evade, &channels, &state).await;

            // Mission commands while the payload is missing
            channels
                .motion
                .send(MotionCommand::Drive(DriveCommand::new(100.0, 0.0)))
                .await;
            channels
                .motion
                .send(MotionCommand::Maneuver(Maneuver::Straight { mm: 50.0 }))
                .await;
            settle(&channels).await;
            assert!(channels.maneuver_done.try_receive().is_err());

            let restore = check(&watchdog, true, &state).unwrap();
            handle(&watchdog, restore, &channels, &state).await;
            assert!(!state.emergency_active());
            channels.maneuver_done.receive().await
        };

        let report = match block_on(select(
            drivetrain_task(hw, &channels, &state),
            script,
        )) {
            Either::Second(report) => report,
            Either::First(()) => unreachable!(),
        };

        assert_eq!(report.maneuver, Maneuver::Straight { mm: 50.0 });
        assert_eq!(report.odometry_mm, 50.0);
        assert_eq!(
            *calls.borrow(),
            [
                "drive 0 0",
                "turn 90",
                "straight -100",
                "straight 100",
                "turn -90",
                "drive 0 0",
                "straight 50",
            ]
        );
    }

    #[test]
    fn test_maneuver_runs_between_restore_and_flag_clear() {
        let hw = hardware();
        let channels: RobotChannels<NoopRawMutex> = RobotChannels::new();
        let state = RobotState::new();
        let watchdog = EmergencyWatchdog::new(EmergencyConfig::default());
        state.set_emergency_active(true);

        let script = async {
            // Restore served, but the watchdog has not cleared its flag yet
            channels.preempt_done.reset();
            channels
                .preempt
                .send(Preemption {
                    action: EmergencyAction::Restore,
                    maneuvers: watchdog.maneuvers(EmergencyAction::Restore),
                })
                .await;
            channels.preempt_done.wait().await;
            assert!(state.emergency_active());

            channels
                .motion
                .send(MotionCommand::Maneuver(Maneuver::Turn { degrees: 30.0 }))
                .await;
            channels.maneuver_done.receive().await
        };

        let report = match block_on(select(
            drivetrain_task(hw, &channels, &state),
            script,
        )) {
            Either::Second(report) => report,
            Either::First(()) => unreachable!(),
        };
        assert_eq!(report.maneuver, Maneuver::Turn { degrees: 30.0 });
    }

    #[test]
    fn test_held_maneuver_runs_once_flag_clears() {
        let hw = hardware();
        let channels: RobotChannels<NoopRawMutex> = RobotChannels::new();
        let state = RobotState::new();
        state.set_emergency_active(true);

        let script = async {
            channels
                .motion
                .send(MotionCommand::Maneuver(Maneuver::Halt))
                .await;
            settle(&channels).await;
            assert!(channels.maneuver_done.try_receive().is_err());

            // Any later command wakes the task, the held maneuver goes first
            state.set_emergency_active(false);
            channels
                .motion
                .send(MotionCommand::Drive(DriveCommand::new(80.0, 0.0)))
                .await;
            channels.maneuver_done.receive().await
        };

        let report = match block_on(select(
            drivetrain_task(hw, &channels, &state),
            script,
        )) {
            Either::Second(report) => report,
            Either::First(()) => unreachable!(),
        };
        assert_eq!(report.maneuver, Maneuver::Halt);
    }
}
