//! Color perception
//!
//! Maps three-channel color sensor readings onto named labels from a
//! calibrated reference table.

pub mod classifier;
pub mod profile;
pub mod sample;

pub use classifier::{overlaps, ColorClassifier, ColorSet};
pub use profile::{
    ColorEntry, ColorId, ColorLabel, ColorProfile, ProfileError, BLACK, MAX_COLORS,
    MAX_LABEL_LEN, WHITE, YELLOW_LINE,
};
pub use sample::ColorSample;
