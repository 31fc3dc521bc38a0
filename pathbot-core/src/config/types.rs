//! Configuration type definitions
//!
//! Every tuning constant of the robot lives here and is injected at startup.
//! Defaults reproduce the reference robot on the reference course.

use heapless::Vec;

use crate::color::{ColorLabel, ColorProfile, ColorSet, MAX_COLORS, BLACK, WHITE, YELLOW_LINE};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Maximum warehouse procedures per config
pub const MAX_WAREHOUSES: usize = 8;

/// Maximum pallet slots per warehouse
pub const MAX_SLOTS: usize = 3;

/// Build a label from a literal, truncating to nothing if it does not fit
pub fn label(text: &str) -> ColorLabel {
    ColorLabel::try_from(text).unwrap_or_default()
}

/// Line-tracking controller tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SteeringConfig {
    /// Turn rate (deg/s) per unit of deviation
    pub amplifier: f32,
    /// Base forward speed when empty (mm/s)
    pub drive_speed: f32,
    /// Base forward speed when carrying a pallet (mm/s)
    pub loaded_speed: f32,
    /// Constant term of the speed divisor
    pub speed_floor: f32,
    /// Speed divisor growth per unit of deviation
    pub speed_decay: f32,
    /// Deviation magnitude beyond which the line counts as lost
    pub lost_line_threshold: f32,
    /// First recovery rotation toward the line (deg)
    pub recovery_turn_deg: f32,
    /// Second, wider recovery rotation (deg)
    pub recovery_wide_turn_deg: f32,
    /// Reverse distance after the wide rotation (mm)
    pub recovery_reverse_mm: f32,
    /// Turn rate while over the followed color in single-color mode (deg/s)
    pub follow_on_turn: f32,
    /// Turn rate while off the followed color in single-color mode (deg/s)
    pub follow_off_turn: f32,
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            amplifier: 0.65,
            drive_speed: 75.0,
            loaded_speed: 40.0,
            speed_floor: 1.0,
            speed_decay: 0.02,
            lost_line_threshold: 60.0,
            recovery_turn_deg: 20.0,
            recovery_wide_turn_deg: 45.0,
            recovery_reverse_mm: 30.0,
            follow_on_turn: -25.0,
            follow_off_turn: 45.0,
        }
    }
}

/// How the gripper takes hold of a pallet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GripMode {
    /// Lift to a fixed angle (raised pallets)
    ToAngle { speed: i32, angle: i32 },
    /// Lift until the actuator stalls (floor-level pallets)
    UntilStalled { speed: i32 },
}

impl Default for GripMode {
    fn default() -> Self {
        GripMode::ToAngle {
            speed: 200,
            angle: -50,
        }
    }
}

/// Pallet acquisition tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AcquisitionConfig {
    /// Creep speed toward the pallet (mm/s)
    pub crawl_speed: f32,
    /// Time budget for contact (ms)
    pub timeout_ms: u32,
    /// Gripper angle declared before each attempt
    pub gripper_zero_angle: i32,
    /// Speed used to lower the gripper on delivery (deg/s)
    pub release_speed: i32,
    /// Default grip for warehouses without their own
    pub grip: GripMode,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            crawl_speed: 60.0,
            timeout_ms: 6000,
            gripper_zero_angle: 0,
            release_speed: 200,
            grip: GripMode::default(),
        }
    }
}

/// Obstacle watchdog behavior while a pallet is carried
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CarryPolicy {
    /// Stop for obstacles regardless of payload
    AlwaysMonitor,
    /// Never stop for obstacles while carrying
    #[default]
    SuspendWhileCarrying,
    /// While carrying, readings closer than `ignore_within_mm` are the
    /// carried pallet itself and do not stop the robot
    PresenceGated { ignore_within_mm: u16 },
}

/// Obstacle watchdog tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleConfig {
    /// Stop when an obstacle is closer than this (mm)
    pub stop_threshold_mm: u16,
    /// Polling period (ms)
    pub poll_ms: u32,
    /// Behavior while carrying
    pub carry_policy: CarryPolicy,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            stop_threshold_mm: 350,
            poll_ms: 50,
            carry_policy: CarryPolicy::default(),
        }
    }
}

/// Dropped-payload recovery tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct EmergencyConfig {
    /// Turn away from the dropped pallet (deg)
    pub evade_turn_deg: f32,
    /// Retreat distance after turning away (mm)
    pub retreat_mm: f32,
    /// Polling period (ms)
    pub poll_ms: u32,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            evade_turn_deg: 90.0,
            retreat_mm: 100.0,
            poll_ms: 50,
        }
    }
}

/// Hub geometry and maneuvers
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HubConfig {
    /// Ring line followed around the hub
    pub ring: ColorLabel,
    /// Marker at the hub's center, reached when returning
    pub center: ColorLabel,
    /// Off-path floor color
    pub background: ColorLabel,
    /// Turn onto a path or back onto the ring (deg)
    pub align_turn_deg: f32,
    /// Turn out of a warehouse when empty (deg)
    pub egress_turn_deg: f32,
    /// Turn out of a warehouse when carrying (deg)
    pub egress_turn_loaded_deg: f32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ring: label(YELLOW_LINE),
            center: label("hub-center"),
            background: label(WHITE),
            align_turn_deg: -94.5,
            egress_turn_deg: 135.0,
            egress_turn_loaded_deg: 160.0,
        }
    }
}

/// Pallet delivery zone
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DropOffConfig {
    /// Zone color
    pub zone: ColorLabel,
    /// Distance driven into the zone before lowering the pallet (mm)
    pub drive_in_mm: f32,
}

impl Default for DropOffConfig {
    fn default() -> Self {
        Self {
            zone: label("green"),
            drive_in_mm: 100.0,
        }
    }
}

/// One pallet slot inside a warehouse
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SlotPlan {
    /// Line marking the slot
    pub marker: ColorLabel,
    /// Turn toward this slot from the previous one (deg)
    pub lateral_turn_deg: f32,
    /// Withdrawal distance as a multiple of the approach distance
    pub withdraw_multiplier: u8,
}

impl SlotPlan {
    /// Create a slot plan
    pub fn new(marker: &str, lateral_turn_deg: f32, withdraw_multiplier: u8) -> Self {
        Self {
            marker: label(marker),
            lateral_turn_deg,
            withdraw_multiplier,
        }
    }
}

/// Per-destination pallet search procedure
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct WarehouseProcedure {
    /// Destination color this procedure applies to
    pub destination: ColorLabel,
    /// A slot counts as occupied when the distance reading is within this (mm)
    pub occupied_within_mm: u16,
    /// Slots in probing order, the first straight ahead of the entry
    pub slots: Vec<SlotPlan, MAX_SLOTS>,
    /// Grip override for this warehouse
    pub grip: Option<GripMode>,
}

impl WarehouseProcedure {
    /// Procedure with a single slot straight ahead
    pub fn straight_ahead(destination: &str) -> Self {
        let mut slots = Vec::new();
        let _ = slots.push(SlotPlan::new(YELLOW_LINE, 0.0, 1));
        Self {
            destination: label(destination),
            occupied_within_mm: 500,
            slots,
            grip: None,
        }
    }

    /// Procedure with a second slot reached by turning `lateral_turn_deg`
    pub fn two_slots(destination: &str, lateral_turn_deg: f32) -> Self {
        let mut procedure = Self::straight_ahead(destination);
        let _ = procedure
            .slots
            .push(SlotPlan::new(YELLOW_LINE, lateral_turn_deg, 2));
        procedure
    }
}

/// Complete mission configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MissionConfig {
    /// Classifier tolerance per channel
    pub tolerance: u16,
    /// Control tick period (ms)
    pub tick_ms: u32,
    /// Line-tracking tuning
    pub steering: SteeringConfig,
    /// Pallet acquisition tuning
    pub acquisition: AcquisitionConfig,
    /// Obstacle watchdog tuning
    pub obstacle: ObstacleConfig,
    /// Dropped-payload recovery tuning
    pub emergency: EmergencyConfig,
    /// Hub geometry
    pub hub: HubConfig,
    /// Marker at the end of each path
    pub entry_marker: ColorLabel,
    /// Path colors radiating from the hub
    pub spokes: Vec<ColorLabel, MAX_COLORS>,
    /// Delivery zone, if the course has one
    pub drop_off: Option<DropOffConfig>,
    /// Warehouse procedures by destination
    pub warehouses: Vec<WarehouseProcedure, MAX_WAREHOUSES>,
}

impl Default for MissionConfig {
    fn default() -> Self {
        let mut spokes = Vec::new();
        for spoke in ["red", "blue", "brown", "green"] {
            let _ = spokes.push(label(spoke));
        }

        let mut warehouses = Vec::new();
        let _ = warehouses.push(WarehouseProcedure::two_slots("red", -90.0));
        let _ = warehouses.push(WarehouseProcedure::two_slots("blue", 90.0));
        let mut brown = WarehouseProcedure::straight_ahead("brown");
        brown.grip = Some(GripMode::UntilStalled { speed: -200 });
        let _ = warehouses.push(brown);

        Self {
            tolerance: 8,
            tick_ms: 20,
            steering: SteeringConfig::default(),
            acquisition: AcquisitionConfig::default(),
            obstacle: ObstacleConfig::default(),
            emergency: EmergencyConfig::default(),
            hub: HubConfig::default(),
            entry_marker: label(BLACK),
            spokes,
            drop_off: Some(DropOffConfig::default()),
            warehouses,
        }
    }
}

impl MissionConfig {
    /// Procedure for a destination label
    pub fn warehouse(&self, destination: &str) -> Option<&WarehouseProcedure> {
        self.warehouses
            .iter()
            .find(|w| w.destination.as_str() == destination)
    }

    /// Colors the operator may pick: every spoke plus the drop-off zone
    pub fn destinations(&self, profile: &ColorProfile) -> ColorSet {
        let zone = self.drop_off.as_ref().map(|d| d.zone.as_str());
        profile.set(self.spokes.iter().map(|s| s.as_str()).chain(zone))
    }
}
