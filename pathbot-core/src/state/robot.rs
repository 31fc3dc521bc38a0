//! Robot state shared between the mission loop, watchdogs and operator input
//!
//! Fields are plain atomics accessed with loads and stores only, so the
//! steering loop never waits on a lock and targets without compare-and-swap
//! are supported. Each field has exactly one writer role:
//!
//! | Field                 | Writer                 |
//! |-----------------------|------------------------|
//! | `location`            | mission navigator      |
//! | `carrying_payload`    | mission navigator      |
//! | `road_clear`          | obstacle watchdog      |
//! | `emergency_active`    | emergency watchdog     |
//! | `desired_destination` | operator input, navigator after pickup |

use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::color::ColorId;

/// Where the robot is on the course
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Location {
    /// On the hub ring
    Hub,
    /// Following the path of the given color
    OnPathTo(ColorId),
    /// Inside the warehouse of the given color
    AtWarehouse(ColorId),
    /// Inside the pickup and delivery zone
    PickupZone,
}

const TAG_HUB: u16 = 0;
const TAG_ON_PATH: u16 = 1;
const TAG_AT_WAREHOUSE: u16 = 2;
const TAG_PICKUP: u16 = 3;

/// Marker for "no destination chosen"
const NO_DESTINATION: u8 = u8::MAX;

impl Location {
    fn encode(self) -> u16 {
        match self {
            Location::Hub => TAG_HUB << 8,
            Location::OnPathTo(id) => (TAG_ON_PATH << 8) | id.index() as u16,
            Location::AtWarehouse(id) => (TAG_AT_WAREHOUSE << 8) | id.index() as u16,
            Location::PickupZone => TAG_PICKUP << 8,
        }
    }

    fn decode(raw: u16) -> Self {
        let color = ColorId::new((raw & 0xFF) as u8);
        match (raw >> 8, color) {
            (TAG_ON_PATH, Some(id)) => Location::OnPathTo(id),
            (TAG_AT_WAREHOUSE, Some(id)) => Location::AtWarehouse(id),
            (TAG_PICKUP, _) => Location::PickupZone,
            _ => Location::Hub,
        }
    }
}

/// Process-wide robot state
#[derive(Debug)]
pub struct RobotState {
    location: AtomicU16,
    carrying_payload: AtomicBool,
    road_clear: AtomicBool,
    emergency_active: AtomicBool,
    desired_destination: AtomicU8,
}

impl Default for RobotState {
    fn default() -> Self {
        Self::new()
    }
}

impl RobotState {
    /// Create the power-on state: at the hub, empty, road clear, no destination
    pub const fn new() -> Self {
        Self {
            location: AtomicU16::new(TAG_HUB << 8),
            carrying_payload: AtomicBool::new(false),
            road_clear: AtomicBool::new(true),
            emergency_active: AtomicBool::new(false),
            desired_destination: AtomicU8::new(NO_DESTINATION),
        }
    }

    /// Current location
    pub fn location(&self) -> Location {
        Location::decode(self.location.load(Ordering::Acquire))
    }

    /// Record a new location
    pub fn set_location(&self, location: Location) {
        self.location.store(location.encode(), Ordering::Release);
    }

    /// Check if a pallet is held by the gripper
    pub fn carrying_payload(&self) -> bool {
        self.carrying_payload.load(Ordering::Acquire)
    }

    /// Record a successful pallet acquisition
    pub fn mark_payload_gripped(&self) {
        self.carrying_payload.store(true, Ordering::Release);
    }

    /// Record that the pallet was put down at its delivery point
    pub fn mark_payload_delivered(&self) {
        self.carrying_payload.store(false, Ordering::Release);
    }

    /// Check if the path ahead is free of obstacles
    pub fn road_clear(&self) -> bool {
        self.road_clear.load(Ordering::Acquire)
    }

    /// Record the obstacle watchdog's verdict
    pub fn set_road_clear(&self, clear: bool) {
        self.road_clear.store(clear, Ordering::Release);
    }

    /// Check if a dropped-payload emergency is being handled
    pub fn emergency_active(&self) -> bool {
        self.emergency_active.load(Ordering::Acquire)
    }

    /// Enter or leave emergency mode
    pub fn set_emergency_active(&self, active: bool) {
        self.emergency_active.store(active, Ordering::Release);
    }

    /// Destination the operator asked for, if any
    pub fn desired_destination(&self) -> Option<ColorId> {
        ColorId::new(self.desired_destination.load(Ordering::Acquire))
    }

    /// Choose the next destination
    pub fn set_desired_destination(&self, destination: ColorId) {
        self.desired_destination
            .store(destination.index(), Ordering::Release);
    }

    /// Forget the chosen destination
    pub fn clear_desired_destination(&self) {
        self.desired_destination
            .store(NO_DESTINATION, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: u8) -> ColorId {
        ColorId::new(index).unwrap()
    }

    #[test]
    fn test_power_on_state() {
        let state = RobotState::new();
        assert_eq!(state.location(), Location::Hub);
        assert!(!state.carrying_payload());
        assert!(state.road_clear());
        assert!(!state.emergency_active());
        assert_eq!(state.desired_destination(), None);
    }

    #[test]
    fn test_location_round_trip() {
        let state = RobotState::new();
        for location in [
            Location::OnPathTo(id(3)),
            Location::AtWarehouse(id(15)),
            Location::PickupZone,
            Location::Hub,
        ] {
            state.set_location(location);
            assert_eq!(state.location(), location);
        }
    }

    #[test]
    fn test_payload_flag() {
        let state = RobotState::new();
        state.mark_payload_gripped();
        assert!(state.carrying_payload());
        state.mark_payload_delivered();
        assert!(!state.carrying_payload());
    }

    #[test]
    fn test_desired_destination() {
        let state = RobotState::new();
        state.set_desired_destination(id(2));
        assert_eq!(state.desired_destination(), Some(id(2)));
        state.clear_desired_destination();
        assert_eq!(state.desired_destination(), None);
    }
}
