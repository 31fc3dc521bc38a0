//! Simple TOML parser for robot configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! pathbot configuration. It does NOT support the full TOML language.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - [section] headers
//! - [section.name] headers
//! - Arrays of scalars: spokes = ["red", "blue"]
//! - Inline tables: grip = { mode = "to_angle", speed = 200, angle = -50 }
//! - Arrays of inline tables: slots = [{ marker = "yellow-line" }]
//! - Comments (# ...)
//!
//! NOT supported:
//! - Multi-line strings or arrays
//! - Nested inline tables
//! - Dotted keys outside section headers
//!
//! Values are overlaid onto [`MissionConfig::default`] and the reference
//! color table, so a file only needs the keys it changes.

use heapless::Vec;

use pathbot_core::color::{ColorLabel, ColorProfile, ColorSample, ProfileError, MAX_COLORS};
use pathbot_core::config::{
    CarryPolicy, DropOffConfig, GripMode, MissionConfig, SlotPlan, WarehouseProcedure,
    MAX_SLOTS,
};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Invalid section header
    InvalidSection,
    /// Invalid value type
    InvalidValue,
    /// Too many items (exceeded heapless capacity)
    TooManyItems,
}

impl From<ProfileError> for ParseError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::Full => ParseError::TooManyItems,
            ProfileError::LabelTooLong => ParseError::InvalidSection,
        }
    }
}

/// Everything a robot config file describes
#[derive(Debug, Clone, PartialEq)]
pub struct RobotConfig {
    /// Mission tuning
    pub mission: MissionConfig,
    /// Calibrated color references
    pub profile: ColorProfile,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            mission: MissionConfig::default(),
            profile: ColorProfile::reference_table(),
        }
    }
}

/// Current parsing context
#[derive(Debug, Clone)]
enum Section {
    Root,
    Steering,
    Acquisition,
    Obstacle,
    Emergency,
    Hub,
    DropOff,
    Warehouse(ColorLabel),
    Color(ColorLabel),
}

/// Parse TOML configuration into a [`RobotConfig`]
pub fn parse_config(input: &str) -> Result<RobotConfig, ParseError> {
    let mut config = RobotConfig::default();
    let mut section = Section::Root;

    // Warehouse section being built
    let mut current_warehouse: Option<WarehouseProcedure> = None;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // Check for section header
        if line.starts_with('[') && line.ends_with(']') {
            save_warehouse(&mut config.mission, &mut current_warehouse)?;

            section = parse_section_header(&line[1..line.len() - 1])?;

            if let Section::Warehouse(name) = &section {
                current_warehouse = Some(
                    config
                        .mission
                        .warehouse(name)
                        .cloned()
                        .unwrap_or_else(|| WarehouseProcedure::straight_ahead(name)),
                );
            }
            continue;
        }

        // Parse key = value
        if let Some((key, value)) = parse_key_value(line) {
            apply_value(&section, key, value, &mut config, &mut current_warehouse)?;
        }
    }

    save_warehouse(&mut config.mission, &mut current_warehouse)?;

    Ok(config)
}

/// Parse a section header like "steering" or "warehouse.red"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    let header = header.trim();

    if let Some((kind, name)) = header.split_once('.') {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParseError::InvalidSection);
        }
        let name = ColorLabel::try_from(name).map_err(|_| ParseError::InvalidSection)?;

        return match kind.trim() {
            "warehouse" => Ok(Section::Warehouse(name)),
            "color" => Ok(Section::Color(name)),
            _ => Err(ParseError::InvalidSection),
        };
    }

    match header {
        "steering" => Ok(Section::Steering),
        "acquisition" => Ok(Section::Acquisition),
        "obstacle" => Ok(Section::Obstacle),
        "emergency" => Ok(Section::Emergency),
        "hub" => Ok(Section::Hub),
        "drop_off" => Ok(Section::DropOff),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse a key = value line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (with or without quotes)
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

fn parse_label(value: &str) -> Result<ColorLabel, ParseError> {
    ColorLabel::try_from(parse_string(value)?).map_err(|_| ParseError::InvalidValue)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_float(value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Finite float strictly above zero
fn parse_positive(value: &str) -> Result<f32, ParseError> {
    let v = parse_float(value)?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Finite float at or above zero
fn parse_non_negative(value: &str) -> Result<f32, ParseError> {
    let v = parse_float(value)?;
    if v.is_finite() && v >= 0.0 {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Strip the delimiters of an array or inline table
fn strip_delimited(value: &str, open: char, close: char) -> Result<&str, ParseError> {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with(open) && value.ends_with(close) {
        Ok(&value[1..value.len() - 1])
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Parse an array of scalars: ["red", "blue"] or [1, 2, 3]
fn parse_array(value: &str) -> Result<impl Iterator<Item = &str>, ParseError> {
    let inner = strip_delimited(value, '[', ']')?;
    Ok(inner.split(',').map(str::trim).filter(|item| !item.is_empty()))
}

fn parse_labels(value: &str) -> Result<Vec<ColorLabel, MAX_COLORS>, ParseError> {
    let mut labels = Vec::new();
    for item in parse_array(value)? {
        labels
            .push(parse_label(item)?)
            .map_err(|_| ParseError::TooManyItems)?;
    }
    Ok(labels)
}

/// Parse an RGB triple: [r, g, b]
fn parse_rgb(value: &str) -> Result<ColorSample, ParseError> {
    let mut channels = [0u16; 3];
    let mut count = 0;
    for item in parse_array(value)? {
        let channel = channels.get_mut(count).ok_or(ParseError::TooManyItems)?;
        *channel = parse_int(item)?;
        count += 1;
    }
    if count != 3 {
        return Err(ParseError::InvalidValue);
    }
    Ok(ColorSample::new(channels[0], channels[1], channels[2]))
}

/// Key/value pairs of an inline table: { key = value, ... }
fn inline_fields(value: &str) -> Result<impl Iterator<Item = (&str, &str)>, ParseError> {
    let inner = strip_delimited(value, '{', '}')?;
    Ok(inner.split(',').filter_map(parse_key_value))
}

/// Parse a grip mode table
fn parse_grip(value: &str) -> Result<GripMode, ParseError> {
    let mut mode = None;
    let mut speed = None;
    let mut angle = None;

    for (key, value) in inline_fields(value)? {
        match key {
            "mode" => mode = Some(parse_string(value)?),
            "speed" => speed = Some(parse_int(value)?),
            "angle" => angle = Some(parse_int(value)?),
            _ => {}
        }
    }

    let speed = speed.ok_or(ParseError::InvalidValue)?;
    match mode {
        Some("to_angle") => Ok(GripMode::ToAngle {
            speed,
            angle: angle.ok_or(ParseError::InvalidValue)?,
        }),
        Some("until_stalled") => Ok(GripMode::UntilStalled { speed }),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse a carry policy: "always", "suspend" or a presence-gated table
fn parse_carry_policy(value: &str) -> Result<CarryPolicy, ParseError> {
    if value.starts_with('{') {
        let mut mode = None;
        let mut ignore_within_mm = None;
        for (key, value) in inline_fields(value)? {
            match key {
                "mode" => mode = Some(parse_string(value)?),
                "ignore_within_mm" => ignore_within_mm = Some(parse_int(value)?),
                _ => {}
            }
        }
        return match (mode, ignore_within_mm) {
            (Some("presence_gated"), Some(ignore_within_mm)) => {
                Ok(CarryPolicy::PresenceGated { ignore_within_mm })
            }
            _ => Err(ParseError::InvalidValue),
        };
    }

    match parse_string(value)? {
        "always" => Ok(CarryPolicy::AlwaysMonitor),
        "suspend" => Ok(CarryPolicy::SuspendWhileCarrying),
        _ => Err(ParseError::InvalidValue),
    }
}

/// Parse slot plans: [{ marker = "x", lateral_turn_deg = 0, withdraw_multiplier = 1 }, ...]
fn parse_slots(value: &str) -> Result<Vec<SlotPlan, MAX_SLOTS>, ParseError> {
    let mut slots = Vec::new();

    let inner = strip_delimited(value, '[', ']')?;

    // Split on top-level inline tables
    let mut depth = 0;
    let mut start = 0;

    for (i, c) in inner.char_indices() {
        match c {
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let slot = parse_single_slot(&inner[start..=i])?;
                    slots.push(slot).map_err(|_| ParseError::TooManyItems)?;
                }
            }
            _ => {}
        }
    }

    if depth != 0 || slots.is_empty() {
        return Err(ParseError::InvalidValue);
    }

    Ok(slots)
}

fn parse_single_slot(s: &str) -> Result<SlotPlan, ParseError> {
    let mut slot = SlotPlan::new(pathbot_core::color::YELLOW_LINE, 0.0, 1);

    for (key, value) in inline_fields(s)? {
        match key {
            "marker" => slot.marker = parse_label(value)?,
            "lateral_turn_deg" => slot.lateral_turn_deg = parse_float(value)?,
            "withdraw_multiplier" => slot.withdraw_multiplier = parse_int(value)?,
            _ => {}
        }
    }

    Ok(slot)
}

/// Apply a key-value pair to the current section
fn apply_value(
    section: &Section,
    key: &str,
    value: &str,
    config: &mut RobotConfig,
    current_warehouse: &mut Option<WarehouseProcedure>,
) -> Result<(), ParseError> {
    let mission = &mut config.mission;

    match section {
        Section::Root => match key {
            "tolerance" => mission.tolerance = parse_int(value)?,
            "tick_ms" => mission.tick_ms = parse_int(value)?,
            "entry_marker" => mission.entry_marker = parse_label(value)?,
            "spokes" => mission.spokes = parse_labels(value)?,
            _ => {}
        },
        Section::Steering => {
            let steering = &mut mission.steering;
            match key {
                "amplifier" => steering.amplifier = parse_float(value)?,
                "drive_speed" => steering.drive_speed = parse_float(value)?,
                "loaded_speed" => steering.loaded_speed = parse_float(value)?,
                // Divisor of the forward speed, must stay above zero
                "speed_floor" => steering.speed_floor = parse_positive(value)?,
                "speed_decay" => steering.speed_decay = parse_non_negative(value)?,
                "lost_line_threshold" => steering.lost_line_threshold = parse_float(value)?,
                "recovery_turn_deg" => steering.recovery_turn_deg = parse_float(value)?,
                "recovery_wide_turn_deg" => {
                    steering.recovery_wide_turn_deg = parse_float(value)?
                }
                "recovery_reverse_mm" => steering.recovery_reverse_mm = parse_float(value)?,
                "follow_on_turn" => steering.follow_on_turn = parse_float(value)?,
                "follow_off_turn" => steering.follow_off_turn = parse_float(value)?,
                _ => {}
            }
        }
        Section::Acquisition => {
            let acquisition = &mut mission.acquisition;
            match key {
                "crawl_speed" => acquisition.crawl_speed = parse_float(value)?,
                "timeout_ms" => acquisition.timeout_ms = parse_int(value)?,
                "gripper_zero_angle" => acquisition.gripper_zero_angle = parse_int(value)?,
                "release_speed" => acquisition.release_speed = parse_int(value)?,
                "grip" => acquisition.grip = parse_grip(value)?,
                _ => {}
            }
        }
        Section::Obstacle => {
            let obstacle = &mut mission.obstacle;
            match key {
                "stop_threshold_mm" => obstacle.stop_threshold_mm = parse_int(value)?,
                "poll_ms" => obstacle.poll_ms = parse_int(value)?,
                "carry_policy" => obstacle.carry_policy = parse_carry_policy(value)?,
                _ => {}
            }
        }
        Section::Emergency => {
            let emergency = &mut mission.emergency;
            match key {
                "evade_turn_deg" => emergency.evade_turn_deg = parse_float(value)?,
                "retreat_mm" => emergency.retreat_mm = parse_float(value)?,
                "poll_ms" => emergency.poll_ms = parse_int(value)?,
                _ => {}
            }
        }
        Section::Hub => {
            let hub = &mut mission.hub;
            match key {
                "ring" => hub.ring = parse_label(value)?,
                "center" => hub.center = parse_label(value)?,
                "background" => hub.background = parse_label(value)?,
                "align_turn_deg" => hub.align_turn_deg = parse_float(value)?,
                "egress_turn_deg" => hub.egress_turn_deg = parse_float(value)?,
                "egress_turn_loaded_deg" => hub.egress_turn_loaded_deg = parse_float(value)?,
                _ => {}
            }
        }
        Section::DropOff => {
            if key == "enabled" {
                mission.drop_off = if parse_bool(value)? {
                    Some(mission.drop_off.clone().unwrap_or_default())
                } else {
                    None
                };
                return Ok(());
            }

            // Keys of a disabled zone are ignored
            if let Some(drop_off) = mission.drop_off.as_mut() {
                apply_drop_off(drop_off, key, value)?;
            }
        }
        Section::Warehouse(_) => {
            if let Some(warehouse) = current_warehouse.as_mut() {
                match key {
                    "occupied_within_mm" => warehouse.occupied_within_mm = parse_int(value)?,
                    "grip" => warehouse.grip = Some(parse_grip(value)?),
                    "slots" => warehouse.slots = parse_slots(value)?,
                    _ => {}
                }
            }
        }
        Section::Color(name) => {
            if key == "rgb" {
                config.profile.insert(name.as_str(), parse_rgb(value)?)?;
            }
        }
    }

    Ok(())
}

fn apply_drop_off(drop_off: &mut DropOffConfig, key: &str, value: &str) -> Result<(), ParseError> {
    match key {
        "zone" => drop_off.zone = parse_label(value)?,
        "drive_in_mm" => drop_off.drive_in_mm = parse_float(value)?,
        _ => {}
    }
    Ok(())
}

/// Store a finished warehouse section, replacing a procedure of the same destination
fn save_warehouse(
    mission: &mut MissionConfig,
    current: &mut Option<WarehouseProcedure>,
) -> Result<(), ParseError> {
    let Some(procedure) = current.take() else {
        return Ok(());
    };

    match mission
        .warehouses
        .iter_mut()
        .find(|w| w.destination == procedure.destination)
    {
        Some(existing) => *existing = procedure,
        None => mission
            .warehouses
            .push(procedure)
            .map_err(|_| ParseError::TooManyItems)?,
    }

    Ok(())
}
