//! Mission navigator
//!
//! One call to [`Navigator::tick`] per control period. Each call classifies
//! the current reading, advances the phase's step logic and returns at most
//! one motion command:
//!
//! - A [`MotionCommand::Drive`] is superseded by the next tick's command
//! - A [`MotionCommand::Maneuver`] runs to completion; the navigator emits
//!   nothing more until [`Navigator::maneuver_complete`] is called
//!
//! Multi-step motions are queued and handed out one maneuver at a time.
//! Phase changes are applied when the first maneuver of the new phase is
//! queued, not when it finishes.

use heapless::{Deque, Vec};

use super::phase::{Event, MissionPhase};
use super::report::StatusReport;
use crate::acquisition::{AcquireStep, AcquisitionOutcome, PalletSequencer};
use crate::color::{ColorClassifier, ColorId, ColorProfile, ColorSample, ColorSet, YELLOW_LINE};
use crate::config::{MissionConfig, SlotPlan, WarehouseProcedure, MAX_SLOTS};
use crate::motion::{DriveCommand, Maneuver, ManeuverReport, MotionCommand};
use crate::state::{Location, RobotState};
use crate::steering::{LineRecovery, LineTarget, RecoveryStep, Steer, SteeringController};

/// Maximum maneuvers queued at once
const MAX_PENDING: usize = 12;

/// Maximum undelivered status reports; older ones are dropped
const MAX_REPORTS: usize = 8;

/// Navigator construction errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NavigatorError {
    /// A color the steering loop depends on is not in the profile
    MissingReference(&'static str),
}

/// Sensor readings for one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Readings {
    /// Color under the sensor
    pub sample: ColorSample,
    /// Distance to the nearest object ahead (mm)
    pub distance_mm: u16,
    /// Gripper contact switch
    pub contact: bool,
}

/// One sideways leg made while probing warehouse slots
#[derive(Debug, Clone, Copy, PartialEq)]
struct Lateral {
    turn_deg: f32,
    mm: f32,
}

/// Work in progress inside the current phase
#[derive(Debug, Clone, Copy, PartialEq)]
enum Step {
    /// Ordinary line tracking
    Track,
    /// First recovery rotation issued, re-sample next tick
    Recovering(LineRecovery),
    /// Driving straight across paths that are not the destination
    Skipping(ColorSet),
    /// Decide whether the pallet sits in this slot
    Probe(usize),
    /// Crawling sideways to the marker of this slot
    Shift(usize),
    /// Sideways crawl halted, odometry not yet accounted
    Shifted(usize),
    /// Acquisition crawl into this slot
    Crawl(usize),
    /// Crawl halted, withdraw from this slot
    Withdraw(usize, AcquisitionOutcome),
    /// Put the carried pallet down
    DropOff,
}

/// Hub-and-spoke mission state machine
#[derive(Debug)]
pub struct Navigator {
    config: MissionConfig,
    profile: ColorProfile,
    classifier: ColorClassifier,
    steering: SteeringController,
    background: ColorSample,
    ring_target: LineTarget,
    ring: ColorSet,
    center: ColorSet,
    entry: ColorSet,
    spokes: ColorSet,
    drop_off: Option<ColorId>,
    phase: MissionPhase,
    step: Step,
    destination: Option<ColorId>,
    path_target: Option<LineTarget>,
    procedure: WarehouseProcedure,
    sequencer: PalletSequencer,
    lateral: Vec<Lateral, MAX_SLOTS>,
    halt_odometry_mm: f32,
    pending: Deque<Maneuver, MAX_PENDING>,
    in_flight: Option<Maneuver>,
    reports: Deque<StatusReport, MAX_REPORTS>,
    awaiting_reported: bool,
}

impl Navigator {
    /// Create a navigator at the hub, in [`MissionPhase::SelectingPath`]
    ///
    /// The hub ring and background colors must be calibrated; every other
    /// label that is missing simply never matches.
    pub fn new(config: MissionConfig, profile: ColorProfile) -> Result<Self, NavigatorError> {
        let ring_line = profile
            .reference_of(config.hub.ring.as_str())
            .ok_or(NavigatorError::MissingReference("hub ring"))?;
        let background = profile
            .reference_of(config.hub.background.as_str())
            .ok_or(NavigatorError::MissingReference("background"))?;

        let ring = ColorSet::from_option(profile.id(config.hub.ring.as_str()));
        let center = ColorSet::from_option(profile.id(config.hub.center.as_str()));
        let entry = ColorSet::from_option(profile.id(config.entry_marker.as_str()));
        let spokes = profile.set(config.spokes.iter().map(|spoke| spoke.as_str()));
        let drop_off = config
            .drop_off
            .as_ref()
            .and_then(|zone| profile.id(zone.zone.as_str()));

        Ok(Self {
            classifier: ColorClassifier::new(config.tolerance),
            steering: SteeringController::new(config.steering),
            sequencer: PalletSequencer::new(config.acquisition, config.acquisition.grip),
            procedure: WarehouseProcedure::straight_ahead(YELLOW_LINE),
            background,
            ring_target: LineTarget::new(ring_line, background),
            ring,
            center,
            entry,
            spokes,
            drop_off,
            phase: MissionPhase::SelectingPath,
            step: Step::Track,
            destination: None,
            path_target: None,
            lateral: Vec::new(),
            halt_odometry_mm: 0.0,
            pending: Deque::new(),
            in_flight: None,
            reports: Deque::new(),
            awaiting_reported: false,
            config,
            profile,
        })
    }

    /// Current phase
    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    /// Destination of the current trip
    pub fn destination(&self) -> Option<ColorId> {
        self.destination
    }

    /// Calibrated colors
    pub fn profile(&self) -> &ColorProfile {
        &self.profile
    }

    /// Check if a maneuver is running or queued
    pub fn is_maneuvering(&self) -> bool {
        self.in_flight.is_some() || !self.pending.is_empty()
    }

    /// Take the oldest undelivered status report
    pub fn pop_report(&mut self) -> Option<StatusReport> {
        self.reports.pop_front()
    }

    /// Acknowledge the maneuver handed out last
    pub fn maneuver_complete(&mut self, report: ManeuverReport) {
        if self.in_flight.take().is_none() {
            return;
        }
        if report.maneuver == Maneuver::Halt {
            self.halt_odometry_mm = report.odometry_mm;
        }
    }

    /// Advance the mission by one control period
    pub fn tick(
        &mut self,
        now_ms: u32,
        readings: Readings,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        // The drivetrain belongs to the emergency sequence until it clears
        if state.emergency_active() || self.in_flight.is_some() {
            return None;
        }
        if let Some(command) = self.dispatch() {
            return Some(command);
        }

        let seen = self.classifier.classify(readings.sample, &self.profile);
        match self.phase {
            MissionPhase::SelectingPath => self.select_path(seen, readings, state),
            MissionPhase::Traveling => self.travel(seen, readings, state),
            MissionPhase::SearchingPallet => self.search(now_ms, seen, readings, state),
            MissionPhase::ReturningToHub => self.return_to_hub(seen, readings, state),
        }
    }

    fn select_path(
        &mut self,
        seen: ColorSet,
        readings: Readings,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        let Some(desired) = state.desired_destination() else {
            if self.awaiting_reported {
                return None;
            }
            self.awaiting_reported = true;
            self.report(StatusReport::AwaitingDestination);
            return Some(MotionCommand::Drive(DriveCommand::stop()));
        };
        self.awaiting_reported = false;

        // Desired color wins over any co-matching spoke
        if seen.contains(desired) {
            return self.destination_found(desired, state);
        }

        if let Step::Skipping(crossing) = self.step {
            if seen.overlaps(&crossing) {
                return Some(MotionCommand::Drive(self.straight_across(state)));
            }
            self.step = Step::Track;
        }

        let others = self.spokes.without(desired);
        if seen.overlaps(&others) {
            let crossing: ColorSet = seen.iter().filter(|id| others.contains(*id)).collect();
            if let Some(label) = crossing.iter().next().and_then(|id| self.profile.label(id)) {
                let label = crate::config::label(label);
                self.report(StatusReport::DestinationSkipped(label));
            }
            self.step = Step::Skipping(crossing);
            return Some(MotionCommand::Drive(self.straight_across(state)));
        }

        let target = self.ring_target;
        if let Some(command) = self.resume_recovery(&target, self.ring, seen, readings) {
            return Some(command);
        }
        self.follow(&target, readings, state)
    }

    fn travel(
        &mut self,
        seen: ColorSet,
        readings: Readings,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        if seen.overlaps(&self.entry) {
            return self.warehouse_reached(state);
        }

        let target = self.path_target.unwrap_or(self.ring_target);
        if let Some(command) = self.resume_recovery(&target, self.entry, seen, readings) {
            return Some(command);
        }
        self.follow(&target, readings, state)
    }

    fn search(
        &mut self,
        now_ms: u32,
        seen: ColorSet,
        readings: Readings,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        match self.step {
            Step::DropOff => self.drop_off(state),
            Step::Probe(slot) => self.probe(slot, readings),
            Step::Shift(slot) => self.shift(slot, seen),
            Step::Shifted(slot) => {
                let leg = Lateral {
                    turn_deg: self.slot(slot).lateral_turn_deg,
                    mm: self.halt_odometry_mm,
                };
                // One leg per slot after the first
                let _ = self.lateral.push(leg);
                self.probe(slot, readings)
            }
            Step::Crawl(slot) => self.crawl(slot, now_ms, seen, readings),
            Step::Withdraw(slot, outcome) => self.withdraw(slot, outcome, state),
            Step::Track | Step::Recovering(_) | Step::Skipping(_) => {
                self.step = Step::Probe(0);
                None
            }
        }
    }

    fn return_to_hub(
        &mut self,
        seen: ColorSet,
        readings: Readings,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        if seen.overlaps(&self.center) {
            return self.hub_reached(state);
        }

        let target = self.path_target.unwrap_or(self.ring_target);
        if let Some(command) = self.resume_recovery(&target, self.center, seen, readings) {
            return Some(command);
        }
        self.follow(&target, readings, state)
    }

    fn destination_found(&mut self, desired: ColorId, state: &RobotState) -> Option<MotionCommand> {
        let label = self.profile.label(desired).unwrap_or_default();
        let mut procedure = self
            .config
            .warehouse(label)
            .cloned()
            .unwrap_or_else(|| WarehouseProcedure::straight_ahead(label));
        if procedure.slots.is_empty() {
            let _ = procedure.slots.push(SlotPlan::new(YELLOW_LINE, 0.0, 1));
        }

        self.procedure = procedure;
        self.destination = Some(desired);
        self.path_target = self
            .profile
            .reference(desired)
            .map(|line| LineTarget::new(line, self.background));
        self.step = Step::Track;

        state.set_location(Location::OnPathTo(desired));
        self.enter(Event::DestinationFound);
        self.queue(&[Maneuver::Turn {
            degrees: self.config.hub.align_turn_deg,
        }]);
        self.dispatch()
    }

    fn warehouse_reached(&mut self, state: &RobotState) -> Option<MotionCommand> {
        let at_zone = self.drop_off.is_some() && self.destination == self.drop_off;
        if at_zone {
            state.set_location(Location::PickupZone);
        } else if let Some(destination) = self.destination {
            state.set_location(Location::AtWarehouse(destination));
        }

        self.step = if at_zone && state.carrying_payload() {
            Step::DropOff
        } else {
            Step::Probe(0)
        };
        self.lateral.clear();

        self.enter(Event::WarehouseReached);
        self.queue(&[Maneuver::Halt]);
        self.dispatch()
    }

    fn probe(&mut self, slot: usize, readings: Readings) -> Option<MotionCommand> {
        let last = slot + 1 >= self.procedure.slots.len();
        if last || readings.distance_mm <= self.procedure.occupied_within_mm {
            let grip = self.procedure.grip.unwrap_or(self.config.acquisition.grip);
            self.sequencer = PalletSequencer::new(self.config.acquisition, grip);
            self.queue(&self.sequencer.preparation());
            self.step = Step::Crawl(slot);
            return self.dispatch();
        }

        let next = slot + 1;
        self.queue(&[
            Maneuver::Turn {
                degrees: self.slot(next).lateral_turn_deg,
            },
            Maneuver::ResetOdometry,
        ]);
        self.step = Step::Shift(next);
        self.dispatch()
    }

    fn shift(&mut self, slot: usize, seen: ColorSet) -> Option<MotionCommand> {
        if !seen.overlaps(&self.slot_marker(slot)) {
            return Some(MotionCommand::Drive(DriveCommand::new(
                self.config.acquisition.crawl_speed,
                0.0,
            )));
        }

        self.queue(&[
            Maneuver::Halt,
            Maneuver::Turn {
                degrees: -self.slot(slot).lateral_turn_deg,
            },
        ]);
        self.step = Step::Shifted(slot);
        self.dispatch()
    }

    fn crawl(
        &mut self,
        slot: usize,
        now_ms: u32,
        seen: ColorSet,
        readings: Readings,
    ) -> Option<MotionCommand> {
        let on_line = seen.overlaps(&self.slot_marker(slot));
        match self
            .sequencer
            .tick(now_ms, readings.contact, on_line, &self.steering)
        {
            AcquireStep::Crawl(command) => Some(MotionCommand::Drive(command)),
            AcquireStep::Finished(outcome) => {
                self.queue(&[Maneuver::Halt]);
                self.step = Step::Withdraw(slot, outcome);
                self.dispatch()
            }
        }
    }

    fn withdraw(
        &mut self,
        slot: usize,
        outcome: AcquisitionOutcome,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        self.sequencer.complete(outcome, state);
        if outcome.is_success() {
            self.queue(&[self.sequencer.grip_maneuver()]);
            self.report(StatusReport::PalletGripped);
        } else {
            self.report(StatusReport::AcquisitionFailed);
        }

        let multiplier = self.slot(slot).withdraw_multiplier;
        self.queue(&[self.sequencer.withdrawal(self.halt_odometry_mm, multiplier)]);

        // Undo the sideways legs, last one first
        while let Some(leg) = self.lateral.pop() {
            if leg.mm > 0.0 {
                self.queue(&[
                    Maneuver::Turn {
                        degrees: leg.turn_deg,
                    },
                    Maneuver::Straight { mm: -leg.mm },
                    Maneuver::Turn {
                        degrees: -leg.turn_deg,
                    },
                ]);
            }
        }

        self.enter(Event::AcquisitionFinished(outcome));
        self.begin_return(state)
    }

    fn drop_off(&mut self, state: &RobotState) -> Option<MotionCommand> {
        let drive_in = self.config.drop_off.as_ref().map_or(0.0, |zone| zone.drive_in_mm);

        // Cleared before the gripper opens so the release is not taken for a drop
        state.mark_payload_delivered();
        self.queue(&[
            Maneuver::Straight { mm: drive_in },
            Maneuver::GripperToAngle {
                speed: self.config.acquisition.release_speed,
                angle: self.config.acquisition.gripper_zero_angle,
            },
            Maneuver::Straight { mm: -drive_in },
        ]);
        self.report(StatusReport::PayloadDelivered);

        self.enter(Event::DropOffComplete);
        self.begin_return(state)
    }

    fn begin_return(&mut self, state: &RobotState) -> Option<MotionCommand> {
        let degrees = if state.carrying_payload() {
            self.config.hub.egress_turn_loaded_deg
        } else {
            self.config.hub.egress_turn_deg
        };
        self.queue(&[Maneuver::Turn { degrees }]);
        self.step = Step::Track;
        self.dispatch()
    }

    fn hub_reached(&mut self, state: &RobotState) -> Option<MotionCommand> {
        state.set_location(Location::Hub);
        match self.drop_off {
            Some(zone) if state.carrying_payload() => state.set_desired_destination(zone),
            _ => {
                // Leave a destination the operator picked meanwhile alone
                if state.desired_destination() == self.destination {
                    state.clear_desired_destination();
                }
            }
        }

        self.destination = None;
        self.path_target = None;
        self.step = Step::Track;

        self.enter(Event::HubReached);
        self.queue(&[Maneuver::Turn {
            degrees: self.config.hub.align_turn_deg,
        }]);
        self.dispatch()
    }

    /// One tick of line tracking, starting a recovery if the line is lost
    fn follow(
        &mut self,
        target: &LineTarget,
        readings: Readings,
        state: &RobotState,
    ) -> Option<MotionCommand> {
        let steer = self.steering.steer(
            readings.sample,
            target,
            state.carrying_payload(),
            state.road_clear(),
        );
        match steer {
            Steer::Drive(command) => Some(MotionCommand::Drive(command)),
            Steer::Recover(recovery) => {
                self.report(StatusReport::LineLost);
                self.queue(&[recovery.first_rotation(self.steering.config())]);
                self.step = Step::Recovering(recovery);
                self.dispatch()
            }
        }
    }

    /// Second half of a recovery, once the first rotation has finished
    ///
    /// Returns `None` when tracking should resume this tick.
    fn resume_recovery(
        &mut self,
        target: &LineTarget,
        boundary: ColorSet,
        seen: ColorSet,
        readings: Readings,
    ) -> Option<MotionCommand> {
        let Step::Recovering(recovery) = self.step else {
            return None;
        };
        self.step = Step::Track;

        let deviation = self.steering.deviation(readings.sample, target);
        let still_lost = self.steering.is_line_lost(deviation, target);
        match recovery.after_rotation(still_lost, seen.overlaps(&boundary), self.steering.config()) {
            RecoveryStep::Resume => None,
            RecoveryStep::Retreat(maneuvers) => {
                self.queue(&maneuvers);
                self.dispatch()
            }
        }
    }

    fn straight_across(&self, state: &RobotState) -> DriveCommand {
        if !state.road_clear() {
            return DriveCommand::stop();
        }
        DriveCommand::new(self.steering.base_speed(state.carrying_payload()), 0.0)
    }

    fn slot(&self, index: usize) -> SlotPlan {
        self.procedure
            .slots
            .get(index)
            .cloned()
            .unwrap_or_else(|| SlotPlan::new(YELLOW_LINE, 0.0, 1))
    }

    fn slot_marker(&self, index: usize) -> ColorSet {
        ColorSet::from_option(
            self.procedure
                .slots
                .get(index)
                .and_then(|plan| self.profile.id(plan.marker.as_str())),
        )
    }

    fn enter(&mut self, event: Event) {
        let next = self.phase.transition(event);
        if next != self.phase {
            self.phase = next;
            self.report(StatusReport::PhaseChanged(next));
        }
    }

    fn queue(&mut self, maneuvers: &[Maneuver]) {
        for maneuver in maneuvers {
            // Sized for the longest sequence the navigator queues
            let _ = self.pending.push_back(*maneuver);
        }
    }

    fn dispatch(&mut self) -> Option<MotionCommand> {
        let maneuver = self.pending.pop_front()?;
        self.in_flight = Some(maneuver);
        Some(MotionCommand::Maneuver(maneuver))
    }

    fn report(&mut self, report: StatusReport) {
        if self.reports.is_full() {
            self.reports.pop_front();
        }
        let _ = self.reports.push_back(report);
    }
}
