//! Calibrated color reference table
//!
//! A [`ColorProfile`] maps each color label to the sensor reading taken over
//! that color during calibration. Labels are interned as [`ColorId`]s so that
//! classification results fit in a bitset and can be stored atomically.

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::classifier::ColorSet;
use super::sample::ColorSample;

/// Maximum number of labels in a profile
pub const MAX_COLORS: usize = 16;

/// Maximum label length in bytes
pub const MAX_LABEL_LEN: usize = 16;

/// Warehouse entry marker and off-table surface
pub const BLACK: &str = "black";

/// Floor color between paths
pub const WHITE: &str = "white";

/// Boundary line around the hub and along warehouse slots
pub const YELLOW_LINE: &str = "yellow-line";

/// Color label
pub type ColorLabel = String<MAX_LABEL_LEN>;

/// Index of a label inside a [`ColorProfile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorId(u8);

impl ColorId {
    /// Create an id from a raw index
    ///
    /// Returns `None` if the index cannot belong to any profile.
    pub const fn new(index: u8) -> Option<Self> {
        if (index as usize) < MAX_COLORS {
            Some(Self(index))
        } else {
            None
        }
    }

    /// Raw index
    pub const fn index(self) -> u8 {
        self.0
    }
}

/// Profile errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ProfileError {
    /// No room for another label
    Full,
    /// Label longer than [`MAX_LABEL_LEN`]
    LabelTooLong,
}

/// One calibrated color
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorEntry {
    /// Label the operator and configuration refer to
    pub label: ColorLabel,
    /// Reading taken over the color
    pub reference: ColorSample,
}

/// Label to reference sample table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ColorProfile {
    entries: Vec<ColorEntry, MAX_COLORS>,
}

impl ColorProfile {
    /// Create an empty profile
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Table measured on the reference course
    pub fn reference_table() -> Self {
        const TABLE: [(&str, ColorSample); 9] = [
            ("red", ColorSample::new(75, 25, 38)),
            ("blue", ColorSample::new(11, 27, 48)),
            (YELLOW_LINE, ColorSample::new(57, 49, 11)),
            ("brown", ColorSample::new(14, 9, 12)),
            (BLACK, ColorSample::new(3, 3, 2)),
            ("purple", ColorSample::new(14, 12, 47)),
            ("hub-center", ColorSample::new(17, 19, 13)),
            ("green", ColorSample::new(10, 44, 21)),
            (WHITE, ColorSample::new(71, 86, 100)),
        ];

        let mut profile = Self::new();
        for (label, reference) in TABLE {
            // Nine short labels always fit
            let _ = profile.insert(label, reference);
        }
        profile
    }

    /// Add a label or replace the reference of an existing one
    pub fn insert(&mut self, label: &str, reference: ColorSample) -> Result<ColorId, ProfileError> {
        if let Some(id) = self.id(label) {
            self.entries[id.0 as usize].reference = reference;
            return Ok(id);
        }

        let label = ColorLabel::try_from(label).map_err(|_| ProfileError::LabelTooLong)?;
        let index = self.entries.len() as u8;
        self.entries
            .push(ColorEntry { label, reference })
            .map_err(|_| ProfileError::Full)?;
        Ok(ColorId(index))
    }

    /// Look up a label
    pub fn id(&self, label: &str) -> Option<ColorId> {
        self.entries
            .iter()
            .position(|e| e.label.as_str() == label)
            .map(|i| ColorId(i as u8))
    }

    /// Label for an id
    pub fn label(&self, id: ColorId) -> Option<&str> {
        self.entries.get(id.0 as usize).map(|e| e.label.as_str())
    }

    /// Reference sample for an id
    pub fn reference(&self, id: ColorId) -> Option<ColorSample> {
        self.entries.get(id.0 as usize).map(|e| e.reference)
    }

    /// Ids of the given labels; unknown labels are skipped
    pub fn set<'a>(&self, labels: impl IntoIterator<Item = &'a str>) -> ColorSet {
        labels.into_iter().filter_map(|label| self.id(label)).collect()
    }

    /// Reference sample for a label
    pub fn reference_of(&self, label: &str) -> Option<ColorSample> {
        self.id(label).and_then(|id| self.reference(id))
    }

    /// Number of labels
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the profile has no labels
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over ids and entries
    pub fn iter(&self) -> impl Iterator<Item = (ColorId, &ColorEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, e)| (ColorId(i as u8), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_lookup() {
        let mut profile = ColorProfile::new();
        let red = profile.insert("red", ColorSample::new(68, 23, 40)).unwrap();
        let white = profile.insert(WHITE, ColorSample::new(72, 86, 100)).unwrap();

        assert_ne!(red, white);
        assert_eq!(profile.id("red"), Some(red));
        assert_eq!(profile.label(white), Some(WHITE));
        assert_eq!(profile.reference(red), Some(ColorSample::new(68, 23, 40)));
        assert_eq!(profile.id("blue"), None);
    }

    #[test]
    fn test_insert_existing_label_replaces_reference() {
        let mut profile = ColorProfile::new();
        let first = profile.insert("red", ColorSample::new(68, 23, 40)).unwrap();
        let second = profile.insert("red", ColorSample::new(70, 24, 39)).unwrap();

        assert_eq!(first, second);
        assert_eq!(profile.len(), 1);
        assert_eq!(profile.reference_of("red"), Some(ColorSample::new(70, 24, 39)));
    }

    #[test]
    fn test_label_too_long() {
        let mut profile = ColorProfile::new();
        let result = profile.insert("a-very-long-color-label", ColorSample::default());
        assert_eq!(result, Err(ProfileError::LabelTooLong));
        assert!(profile.is_empty());
    }

    #[test]
    fn test_profile_full() {
        let mut profile = ColorProfile::new();
        let labels = [
            "c0", "c1", "c2", "c3", "c4", "c5", "c6", "c7", "c8", "c9", "c10", "c11", "c12",
            "c13", "c14", "c15",
        ];
        for label in labels {
            profile.insert(label, ColorSample::default()).unwrap();
        }
        assert_eq!(
            profile.insert("c16", ColorSample::default()),
            Err(ProfileError::Full)
        );
    }

    #[test]
    fn test_reference_table_has_required_labels() {
        let profile = ColorProfile::reference_table();
        for label in [BLACK, WHITE, YELLOW_LINE, "red", "blue", "green"] {
            assert!(profile.id(label).is_some(), "missing {}", label);
        }
    }

    #[test]
    fn test_set_skips_unknown_labels() {
        let profile = ColorProfile::reference_table();
        let spokes = profile.set(["red", "blue", "orange"]);

        assert_eq!(spokes.len(), 2);
        assert!(spokes.contains(profile.id("red").unwrap()));
        assert!(ColorProfile::new().set(["red"]).is_empty());
    }

    #[test]
    fn test_color_id_bounds() {
        assert!(ColorId::new(0).is_some());
        assert!(ColorId::new(MAX_COLORS as u8 - 1).is_some());
        assert!(ColorId::new(MAX_COLORS as u8).is_none());
    }
}
